//! The cross-reference and taxonomy engine: passage/doctrine lookups,
//! the topic tree, and backup import/export.

mod backup;
mod doctrine;
mod taxonomy;

pub use backup::{
    BackupEngine, EntityKind, ImportError, ImportReport, KindCounts, NoteRecord, Snapshot,
    SnapshotStatistics, SNAPSHOT_VERSION,
};
pub use doctrine::{DoctrineIndex, SuggestionSource, TopicSuggestion};
pub use taxonomy::{TopicNode, TopicTaxonomy};
