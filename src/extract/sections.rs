//! Section stack tracking the heading chain during traversal.

use crate::model::SectionContext;

/// Open headings, outermost first.
///
/// Popping is strictly level-based: entering a heading closes every open
/// heading at the same or a deeper level. Numbering in heading text is not
/// consulted.
#[derive(Debug, Clone, Default)]
pub struct SectionStack {
    entries: Vec<(u8, String)>,
}

impl SectionStack {
    /// Create an empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a heading at `level`.
    ///
    /// Returns the context of the heading itself: its ancestors after
    /// popping, not including the heading.
    pub fn enter(&mut self, title: impl Into<String>, level: u8) -> SectionContext {
        while matches!(self.entries.last(), Some((open, _)) if *open >= level) {
            self.entries.pop();
        }
        let context = self.context();
        self.entries.push((level, title.into()));
        context
    }

    /// Context for content at the current position.
    pub fn context(&self) -> SectionContext {
        SectionContext::from_path(&self.path())
    }

    /// Current heading chain.
    pub fn path(&self) -> Vec<String> {
        self.entries.iter().map(|(_, title)| title.clone()).collect()
    }

    /// Number of open headings.
    pub fn depth(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_h1_h2_h1() {
        let mut stack = SectionStack::new();
        assert!(stack.path().is_empty());

        stack.enter("H1", 1);
        assert_eq!(stack.path(), vec!["H1"]);

        stack.enter("H2", 2);
        assert_eq!(stack.path(), vec!["H1", "H2"]);

        let ctx = stack.enter("Another H1", 1);
        assert!(ctx.section_hierarchy.is_empty());
        assert_eq!(stack.path(), vec!["Another H1"]);
    }

    #[test]
    fn test_sibling_replaces() {
        let mut stack = SectionStack::new();
        stack.enter("Methods", 1);
        stack.enter("Setup", 2);
        let ctx = stack.enter("Procedure", 2);
        assert_eq!(ctx.section_hierarchy, vec!["Methods"]);
        assert_eq!(stack.path(), vec!["Methods", "Procedure"]);
    }

    #[test]
    fn test_skipped_levels() {
        let mut stack = SectionStack::new();
        stack.enter("Part", 1);
        stack.enter("Deep", 4);
        stack.enter("Mid", 3);
        assert_eq!(stack.path(), vec!["Part", "Mid"]);
        assert_eq!(stack.depth(), 2);

        let ctx = stack.context();
        assert_eq!(ctx.parent_section.as_deref(), Some("Part"));
        assert_eq!(ctx.subsection.as_deref(), Some("Mid"));
    }

    #[test]
    fn test_deeper_heading_first() {
        let mut stack = SectionStack::new();
        stack.enter("Orphan", 3);
        stack.enter("Top", 1);
        assert_eq!(stack.path(), vec!["Top"]);
    }
}
