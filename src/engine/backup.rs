//! Whole-dataset export and dependency-ordered transactional import.

use crate::domain::{Annotation, Note, Reference, Series, TagType, Topic, TopicId};
use crate::store::{Store, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current snapshot format version. Bumped whenever the shape changes in
/// a way older readers cannot ignore.
pub const SNAPSHOT_VERSION: u32 = 1;

/// A note together with its flattened secondary-topic memberships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    #[serde(flatten)]
    pub note: Note,
    #[serde(default)]
    pub topic_ids: Vec<TopicId>,
}

/// Row counts captured at export time, for display and sanity checks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStatistics {
    pub note_count: u64,
    pub topic_count: u64,
    pub series_count: u64,
    pub annotation_count: u64,
    pub tag_type_count: u64,
}

/// The full exported dataset.
///
/// Every collection carries a default so snapshots from builds that did
/// not have a given entity kind still import; unknown extra fields are
/// ignored on read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Vec<NoteRecord>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub inline_tag_types: Vec<TagType>,
    #[serde(default)]
    pub series: Vec<Series>,
    #[serde(default)]
    pub systematic_annotations: Vec<Annotation>,
    #[serde(default)]
    pub statistics: SnapshotStatistics,
}

/// Entity kinds reported by the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    TagType,
    Topic,
    Series,
    Annotation,
    Note,
}

/// Per-kind row counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindCounts {
    pub tag_types: u64,
    pub topics: u64,
    pub series: u64,
    pub annotations: u64,
    pub notes: u64,
}

impl KindCounts {
    pub fn total(&self) -> u64 {
        self.tag_types + self.topics + self.series + self.annotations + self.notes
    }
}

/// One skipped row.
#[derive(Debug, Clone, Serialize)]
pub struct ImportError {
    pub id: String,
    pub kind: EntityKind,
    pub error: String,
}

/// The outcome of an import run.
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub inserted: KindCounts,
    pub updated: KindCounts,
    pub errors: Vec<ImportError>,
}

impl ImportReport {
    fn record(&mut self, kind: EntityKind, id: String, result: StoreResult<bool>) {
        let (inserted, updated) = (&mut self.inserted, &mut self.updated);
        match result {
            Ok(was_update) => {
                let counts = if was_update { updated } else { inserted };
                match kind {
                    EntityKind::TagType => counts.tag_types += 1,
                    EntityKind::Topic => counts.topics += 1,
                    EntityKind::Series => counts.series += 1,
                    EntityKind::Annotation => counts.annotations += 1,
                    EntityKind::Note => counts.notes += 1,
                }
            }
            Err(e) => self.errors.push(ImportError {
                id,
                kind,
                error: e.to_string(),
            }),
        }
    }
}

/// Export and import over the whole dataset.
pub struct BackupEngine<'a> {
    store: &'a mut Store,
}

impl<'a> BackupEngine<'a> {
    pub fn new(store: &'a mut Store) -> Self {
        Self { store }
    }

    /// Serializes every entity kind into a versioned snapshot.
    ///
    /// Topics are emitted parent-before-child so the snapshot can be fed
    /// straight back into [`import_all`](Self::import_all).
    pub fn export_all(&self) -> StoreResult<Snapshot> {
        let mut notes = Vec::new();
        for note in self.store.list_notes()? {
            let topic_ids = self.store.note_secondary_topics(note.id())?;
            notes.push(NoteRecord { note, topic_ids });
        }

        let topics = topics_parent_first(self.store.list_topics()?);
        let inline_tag_types = self.store.list_tag_types()?;
        let series = self.store.list_series()?;
        let systematic_annotations = self.store.list_annotations()?;

        let statistics = SnapshotStatistics {
            note_count: notes.len() as u64,
            topic_count: topics.len() as u64,
            series_count: series.len() as u64,
            annotation_count: systematic_annotations.len() as u64,
            tag_type_count: inline_tag_types.len() as u64,
        };

        Ok(Snapshot {
            version: SNAPSHOT_VERSION,
            exported_at: Utc::now(),
            notes,
            topics,
            inline_tag_types,
            series,
            systematic_annotations,
            statistics,
        })
    }

    /// Upserts every row of the snapshot in dependency order: tag types,
    /// topics, series, annotations, then notes with their memberships.
    ///
    /// Each kind runs in its own transaction. A failing row is recorded
    /// in the report and skipped; it never aborts the rest of the run.
    /// Deserialization alone does not enforce the construction
    /// invariants, so topic, annotation, and note rows are rebuilt
    /// through their domain constructors before they touch the store;
    /// a violating row becomes a per-row error. A row that omits its id
    /// receives a freshly generated one and imports as an insert.
    /// Topic rows are taken in snapshot order; a row whose parent is
    /// still missing after the rows before it is skipped with an error.
    /// Annotation rows whose target entry is absent are skipped the same
    /// way, since theology content travels outside the snapshot.
    ///
    /// # Errors
    ///
    /// Fails up front on an unsupported snapshot version; afterwards only
    /// on transaction-level database failures.
    pub fn import_all(&mut self, snapshot: &Snapshot) -> StoreResult<ImportReport> {
        if snapshot.version == 0 || snapshot.version > SNAPSHOT_VERSION {
            return Err(StoreError::InvalidData(format!(
                "unsupported snapshot version {} (expected 1..={})",
                snapshot.version, SNAPSHOT_VERSION
            )));
        }

        let mut report = ImportReport::default();

        let tx = self.store.transaction()?;
        for tag_type in &snapshot.inline_tag_types {
            let result = crate::store::tag_types::upsert_tag_type_row(tx.conn(), tag_type);
            report.record(EntityKind::TagType, tag_type.id.to_string(), result);
        }
        tx.commit()?;

        let tx = self.store.transaction()?;
        for topic in &snapshot.topics {
            let result = validate_topic(topic).and_then(|topic| match topic.parent_id {
                Some(parent) if !crate::store::topics::topic_exists(tx.conn(), parent)? => {
                    Err(StoreError::InvalidRelationship(format!(
                        "parent topic not found: {}",
                        parent
                    )))
                }
                _ => crate::store::topics::upsert_topic_row(tx.conn(), &topic),
            });
            report.record(EntityKind::Topic, topic.id.to_string(), result);
        }
        tx.commit()?;

        let tx = self.store.transaction()?;
        for series in &snapshot.series {
            let result = crate::store::series::upsert_series_row(tx.conn(), series);
            report.record(EntityKind::Series, series.id.to_string(), result);
        }
        tx.commit()?;

        let tx = self.store.transaction()?;
        for annotation in &snapshot.systematic_annotations {
            let result = validate_annotation(annotation).and_then(|annotation| {
                if !crate::store::systematic::entry_exists(tx.conn(), annotation.systematic_id)? {
                    return Err(StoreError::NotFound {
                        kind: "systematic entry",
                        id: annotation.systematic_id.to_string(),
                    });
                }
                crate::store::annotations::upsert_annotation_row(tx.conn(), &annotation)
            });
            report.record(EntityKind::Annotation, annotation.id.to_string(), result);
        }
        tx.commit()?;

        // Each note row writes two tables; the savepoint keeps a row whose
        // membership write fails from leaving a half-imported note behind.
        let tx = self.store.transaction()?;
        for record in &snapshot.notes {
            let result = validate_note(&record.note).and_then(|note| {
                tx.savepoint("note_row", |conn| {
                    let was_update = crate::store::notes::upsert_note_row(conn, &note)?;
                    crate::store::notes::replace_note_topics(conn, note.id(), &record.topic_ids)?;
                    Ok(was_update)
                })
            });
            report.record(EntityKind::Note, record.note.id().to_string(), result);
        }
        tx.commit()?;

        Ok(report)
    }
}

/// Rebuilds a deserialized topic through [`Topic::new`], which is where
/// the name invariant lives.
fn validate_topic(topic: &Topic) -> StoreResult<Topic> {
    let rebuilt = Topic::new(topic.id, topic.name.as_str(), topic.created)
        .map_err(|e| StoreError::InvalidData(e.to_string()))?;
    Ok(Topic {
        parent_id: topic.parent_id,
        sort_order: topic.sort_order,
        systematic_tag_id: topic.systematic_tag_id,
        modified: topic.modified,
        ..rebuilt
    })
}

/// Rebuilds a deserialized annotation through [`Annotation::new`],
/// re-checking the offset order.
fn validate_annotation(annotation: &Annotation) -> StoreResult<Annotation> {
    let rebuilt = Annotation::new(
        annotation.id,
        annotation.systematic_id,
        annotation.kind,
        annotation.start_offset,
        annotation.end_offset,
        annotation.created,
    )
    .map_err(|e| StoreError::InvalidData(e.to_string()))?;
    Ok(Annotation {
        content: annotation.content.clone(),
        ..rebuilt
    })
}

/// Rebuilds a deserialized note through [`Reference::new`] and the note
/// builder, re-checking the range order, the title, and the
/// series-on-sermon rule.
fn validate_note(note: &Note) -> StoreResult<Note> {
    let r = note.reference();
    let reference = Reference::new(
        r.book(),
        r.start_chapter(),
        r.start_verse(),
        r.end_chapter(),
        r.end_verse(),
    )
    .map_err(|e| StoreError::InvalidData(e.to_string()))?;
    Note::builder(note.id(), reference, note.title(), note.created(), note.modified())
        .content(note.content())
        .kind(note.kind())
        .primary_topic(note.primary_topic_id())
        .series(note.series_id())
        .build()
        .map_err(|e| StoreError::InvalidData(e.to_string()))
}

/// Orders topics so every parent precedes its children; topics with a
/// missing parent row sort as roots.
fn topics_parent_first(topics: Vec<Topic>) -> Vec<Topic> {
    use std::collections::HashSet;

    let known: HashSet<TopicId> = topics.iter().map(|t| t.id).collect();
    let mut emitted: HashSet<TopicId> = HashSet::new();
    let mut remaining = topics;
    let mut ordered = Vec::with_capacity(remaining.len());

    while !remaining.is_empty() {
        let before = remaining.len();
        remaining.retain(|topic| {
            let ready = match topic.parent_id {
                Some(parent) => emitted.contains(&parent) || !known.contains(&parent),
                None => true,
            };
            if ready {
                emitted.insert(topic.id);
                ordered.push(topic.clone());
            }
            !ready
        });
        if remaining.len() == before {
            // Cycle in stored data; emit the rest as-is rather than loop.
            ordered.append(&mut remaining);
        }
    }
    ordered
}
