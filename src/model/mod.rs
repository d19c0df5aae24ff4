//! Document model types.
//!
//! Two representations live here: the hierarchical [`DocumentTree`] handed
//! over by a loader, and the flat [`StructuredDocument`] produced by the
//! extractor and persisted as JSON.

mod record;
mod structured;
mod table;
mod tree;

pub use record::{ContentRecord, RecordKind, SectionContext};
pub use structured::{
    AssetKind, AssetRef, DocumentMetadata, ExtractionSettings, ImageRecord, StructuredDocument,
    TableRecord, PROCESSOR_VERSION,
};
pub use table::{TableCell, TableData};
pub use tree::{
    BoundingBox, DocumentTree, ElementImage, Node, NodeKind, Provenance, TextLabel, Walk,
};
