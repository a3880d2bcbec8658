//! Core types: books, verse references, notes, topics, systematic entries.

mod annotation;
mod book;
mod id;
mod note;
mod reference;
mod scripture;
mod series;
mod systematic;
mod tag_type;
mod topic;

pub use annotation::{Annotation, AnnotationKind, ParseAnnotationError};
pub use book::{Book, ParseBookError};
pub use id::{AnnotationId, EntryId, NoteId, ParseIdError, SeriesId, TagTypeId, TopicId};
pub use note::{Note, NoteBuilder, NoteKind, ParseNoteError};
pub use reference::{InvalidRangeError, Reference};
pub use scripture::ScriptureIndexEntry;
pub use series::Series;
pub use systematic::{EntryType, ParseRefError, SystematicEntry, SystematicRef};
pub use tag_type::TagType;
pub use topic::{ParseTopicError, Topic};
