//! JSON serialization of structured documents and summaries.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with 4-space indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize `value` to a JSON string.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let bytes = match format {
        JsonFormat::Pretty => {
            let mut buf = Vec::new();
            let formatter = PrettyFormatter::with_indent(b"    ");
            let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
            value
                .serialize(&mut serializer)
                .map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))?;
            buf
        }
        JsonFormat::Compact => serde_json::to_vec(value)
            .map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))?,
    };

    String::from_utf8(bytes).map_err(|e| Error::Render(format!("JSON is not UTF-8: {}", e)))
}

/// Parse a JSON string, reporting schema mismatches as malformed input.
pub fn from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| Error::MalformedDocument(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ContentRecord, SectionContext, StructuredDocument};

    fn doc() -> StructuredDocument {
        let mut doc = StructuredDocument::default();
        doc.metadata.title = Some("Test".to_string());
        doc.content
            .push(ContentRecord::paragraph("Hello", SectionContext::default()));
        doc
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&doc(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"title\""));
        assert!(json.contains("Test"));
        assert!(json.contains("\n    \"metadata\""));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&doc(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_from_json_round_trip() {
        let original = doc();
        let json = to_json(&original, JsonFormat::Compact).unwrap();
        let back: StructuredDocument = from_json(&json).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_from_json_rejects_wrong_shape() {
        let err = from_json::<StructuredDocument>("{\"content\": 3}").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }
}
