//! Topic taxonomy: tree building, cycle-safe re-parenting, rollup counts,
//! and cascading deletion.

use crate::domain::{Topic, TopicId};
use crate::store::{Store, StoreError, StoreResult};
use chrono::Utc;
use std::collections::{HashMap, HashSet};

/// One topic with its children, as returned by [`TopicTaxonomy::tree`].
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicNode {
    #[serde(flatten)]
    pub topic: Topic,
    /// Rollup note count over the subtree; populated only when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_count: Option<u64>,
    pub children: Vec<TopicNode>,
}

/// Operations over the parent-pointer topic tree.
///
/// The tree view is rebuilt from the flat row set on every read; the
/// acyclicity invariant is enforced at the single mutation point,
/// [`set_parent`](TopicTaxonomy::set_parent).
pub struct TopicTaxonomy<'a> {
    store: &'a mut Store,
}

impl<'a> TopicTaxonomy<'a> {
    pub fn new(store: &'a mut Store) -> Self {
        Self { store }
    }

    /// Builds the topic forest, each level sorted by sort order then name.
    ///
    /// A topic whose parent row is missing is treated as a root rather
    /// than dropped, so partial imports stay visible.
    pub fn tree(&self, include_counts: bool) -> StoreResult<Vec<TopicNode>> {
        let topics = self.store.list_topics()?;
        let known: HashSet<TopicId> = topics.iter().map(|t| t.id).collect();

        let mut children_of: HashMap<TopicId, Vec<Topic>> = HashMap::new();
        let mut roots: Vec<Topic> = Vec::new();
        for topic in topics {
            match topic.parent_id.filter(|p| known.contains(p)) {
                Some(parent) => children_of.entry(parent).or_default().push(topic),
                None => roots.push(topic),
            }
        }

        roots
            .into_iter()
            .map(|t| self.build_node(t, &mut children_of, include_counts))
            .collect()
    }

    fn build_node(
        &self,
        topic: Topic,
        children_of: &mut HashMap<TopicId, Vec<Topic>>,
        include_counts: bool,
    ) -> StoreResult<TopicNode> {
        let note_count = if include_counts {
            Some(self.note_count(topic.id)?)
        } else {
            None
        };
        let children = children_of
            .remove(&topic.id)
            .unwrap_or_default()
            .into_iter()
            .map(|c| self.build_node(c, children_of, include_counts))
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(TopicNode {
            topic,
            note_count,
            children,
        })
    }

    /// Returns the topic's subtree as a set of ids, including the topic
    /// itself.
    ///
    /// Runs a worklist over single-level child queries; the visited set
    /// bounds it by total row count even if stored data were malformed.
    pub fn descendant_ids(&self, topic_id: TopicId) -> StoreResult<HashSet<TopicId>> {
        if self.store.get_topic(topic_id)?.is_none() {
            return Err(StoreError::NotFound {
                kind: "topic",
                id: topic_id.to_string(),
            });
        }

        let mut seen: HashSet<TopicId> = HashSet::new();
        let mut pending = vec![topic_id];
        while let Some(current) = pending.pop() {
            if !seen.insert(current) {
                continue;
            }
            for child in self.store.topic_children(current)? {
                pending.push(child.id);
            }
        }
        Ok(seen)
    }

    /// Counts distinct notes attached anywhere in the topic's subtree,
    /// whether through the primary-topic field or a secondary membership.
    /// A note qualifying both ways counts once.
    pub fn note_count(&self, topic_id: TopicId) -> StoreResult<u64> {
        let ids = self.descendant_ids(topic_id)?;
        let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let placeholders = vec!["?"; id_strings.len()].join(", ");
        let sql = format!(
            "SELECT COUNT(DISTINCT n.id)
             FROM notes n
             LEFT JOIN note_topics nt ON nt.note_id = n.id
             WHERE n.primary_topic_id IN ({0}) OR nt.topic_id IN ({0})",
            placeholders
        );
        let params: Vec<&String> = id_strings.iter().chain(id_strings.iter()).collect();
        let count: i64 = self.store.conn().query_row(
            &sql,
            rusqlite::params_from_iter(params),
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    /// Moves a topic under a new parent, or to the root with `None`.
    ///
    /// The existing parent chain is walked from `new_parent` before any
    /// mutation; reaching `topic_id` means the move would close a cycle.
    ///
    /// # Errors
    ///
    /// `NotFound` when the topic does not exist; `InvalidRelationship` on
    /// self-parenting, a missing parent, or a cycle.
    pub fn set_parent(&mut self, topic_id: TopicId, new_parent: Option<TopicId>) -> StoreResult<()> {
        let topic = self.store.get_topic(topic_id)?.ok_or(StoreError::NotFound {
            kind: "topic",
            id: topic_id.to_string(),
        })?;

        if let Some(parent_id) = new_parent {
            if parent_id == topic_id {
                return Err(StoreError::InvalidRelationship(
                    "a topic cannot be its own parent".to_string(),
                ));
            }
            let parent = self
                .store
                .get_topic(parent_id)?
                .ok_or_else(|| {
                    StoreError::InvalidRelationship(format!(
                        "parent topic not found: {}",
                        parent_id
                    ))
                })?;

            // Walk upward from the prospective parent through the current
            // stored chain. Hitting topic_id means the new edge would
            // close a cycle.
            let mut seen: HashSet<TopicId> = HashSet::new();
            let mut cursor = Some(parent);
            while let Some(current) = cursor {
                if current.id == topic_id {
                    return Err(StoreError::InvalidRelationship(format!(
                        "moving topic {} under {} would create a cycle",
                        topic_id, parent_id
                    )));
                }
                if !seen.insert(current.id) {
                    break;
                }
                cursor = match current.parent_id {
                    Some(next) => self.store.get_topic(next)?,
                    None => None,
                };
            }
        }

        if topic.parent_id == new_parent {
            return Ok(());
        }
        self.store.conn().execute(
            "UPDATE topics SET parent_id = ?1, modified = ?2 WHERE id = ?3",
            rusqlite::params![
                new_parent.map(|id| id.to_string()),
                Utc::now().to_rfc3339(),
                topic_id.to_string(),
            ],
        )?;
        Ok(())
    }

    /// Deletes a topic and its whole subtree atomically.
    ///
    /// Notes pointing into the subtree keep existing: their primary-topic
    /// field is cleared and their secondary memberships for deleted ids
    /// are removed. Returns the number of topic rows deleted.
    pub fn delete(&mut self, topic_id: TopicId) -> StoreResult<u64> {
        let ids = self.descendant_ids(topic_id)?;
        let id_strings: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        let placeholders = vec!["?"; id_strings.len()].join(", ");

        let tx = self.store.transaction()?;
        tx.execute(
            &format!(
                "UPDATE notes SET primary_topic_id = NULL WHERE primary_topic_id IN ({})",
                placeholders
            ),
            rusqlite::params_from_iter(id_strings.iter()),
        )?;
        tx.execute(
            &format!(
                "DELETE FROM note_topics WHERE topic_id IN ({})",
                placeholders
            ),
            rusqlite::params_from_iter(id_strings.iter()),
        )?;
        // Parent pointers carry no database constraint, so the subtree
        // goes in one statement.
        tx.execute(
            &format!("DELETE FROM topics WHERE id IN ({})", placeholders),
            rusqlite::params_from_iter(id_strings.iter()),
        )?;
        tx.commit()?;
        Ok(id_strings.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Note, NoteId, Reference};
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn topic(store: &mut Store, name: &str, parent: Option<TopicId>) -> TopicId {
        let mut t = Topic::new(TopicId::new(), name, now()).unwrap();
        t.parent_id = parent;
        store.upsert_topic(&t).unwrap();
        t.id
    }

    fn note(store: &mut Store, title: &str, primary: Option<TopicId>, secondary: &[TopicId]) {
        let n = Note::builder(
            NoteId::new(),
            Reference::parse("Romans 3:21-26").unwrap(),
            title,
            now(),
            now(),
        )
        .primary_topic(primary)
        .build()
        .unwrap();
        store.upsert_note(&n, secondary).unwrap();
    }

    #[test]
    fn tree_nests_children_under_parents() {
        let mut store = Store::open_in_memory().unwrap();
        let root = topic(&mut store, "Soteriology", None);
        let child = topic(&mut store, "Justification", Some(root));
        topic(&mut store, "Imputation", Some(child));

        let forest = TopicTaxonomy::new(&mut store).tree(false).unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].topic.name, "Soteriology");
        assert_eq!(forest[0].children.len(), 1);
        assert_eq!(forest[0].children[0].children[0].topic.name, "Imputation");
        assert_eq!(forest[0].note_count, None);
    }

    #[test]
    fn tree_treats_orphaned_parent_as_root() {
        let mut store = Store::open_in_memory().unwrap();
        let ghost = TopicId::new();
        topic(&mut store, "Stranded", Some(ghost));

        let forest = TopicTaxonomy::new(&mut store).tree(false).unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].topic.name, "Stranded");
    }

    #[test]
    fn descendant_ids_includes_self_and_whole_subtree() {
        let mut store = Store::open_in_memory().unwrap();
        let root = topic(&mut store, "A", None);
        let b = topic(&mut store, "B", Some(root));
        let c = topic(&mut store, "C", Some(b));
        topic(&mut store, "Unrelated", None);

        let taxonomy = TopicTaxonomy::new(&mut store);
        let ids = taxonomy.descendant_ids(root).unwrap();
        assert_eq!(ids, HashSet::from([root, b, c]));
    }

    #[test]
    fn descendant_ids_of_missing_topic_is_not_found() {
        let mut store = Store::open_in_memory().unwrap();
        let taxonomy = TopicTaxonomy::new(&mut store);
        assert!(matches!(
            taxonomy.descendant_ids(TopicId::new()).unwrap_err(),
            StoreError::NotFound { kind: "topic", .. }
        ));
    }

    #[test]
    fn note_count_unions_primary_and_secondary_membership() {
        let mut store = Store::open_in_memory().unwrap();
        let root = topic(&mut store, "Soteriology", None);
        let child = topic(&mut store, "Justification", Some(root));

        // Qualifies both ways under the same subtree; must count once.
        note(&mut store, "both", Some(root), &[child]);
        note(&mut store, "primary only", Some(child), &[]);
        note(&mut store, "secondary only", None, &[child]);
        note(&mut store, "outside", None, &[]);

        let taxonomy = TopicTaxonomy::new(&mut store);
        assert_eq!(taxonomy.note_count(root).unwrap(), 3);
        assert_eq!(taxonomy.note_count(child).unwrap(), 3);
    }

    #[test]
    fn tree_with_counts_populates_rollups() {
        let mut store = Store::open_in_memory().unwrap();
        let root = topic(&mut store, "Soteriology", None);
        let child = topic(&mut store, "Justification", Some(root));
        note(&mut store, "n", Some(child), &[]);

        let forest = TopicTaxonomy::new(&mut store).tree(true).unwrap();
        assert_eq!(forest[0].note_count, Some(1));
        assert_eq!(forest[0].children[0].note_count, Some(1));
    }

    #[test]
    fn set_parent_rejects_self() {
        let mut store = Store::open_in_memory().unwrap();
        let a = topic(&mut store, "A", None);
        let mut taxonomy = TopicTaxonomy::new(&mut store);
        assert!(matches!(
            taxonomy.set_parent(a, Some(a)).unwrap_err(),
            StoreError::InvalidRelationship(_)
        ));
    }

    #[test]
    fn set_parent_rejects_missing_parent() {
        let mut store = Store::open_in_memory().unwrap();
        let a = topic(&mut store, "A", None);
        let mut taxonomy = TopicTaxonomy::new(&mut store);
        assert!(matches!(
            taxonomy.set_parent(a, Some(TopicId::new())).unwrap_err(),
            StoreError::InvalidRelationship(_)
        ));
    }

    #[test]
    fn set_parent_rejects_cycle_at_depth() {
        let mut store = Store::open_in_memory().unwrap();
        let a = topic(&mut store, "A", None);
        let b = topic(&mut store, "B", Some(a));
        let c = topic(&mut store, "C", Some(b));
        let d = topic(&mut store, "D", Some(c));

        let mut taxonomy = TopicTaxonomy::new(&mut store);
        let err = taxonomy.set_parent(a, Some(d)).unwrap_err();
        assert!(matches!(err, StoreError::InvalidRelationship(_)));

        // The failed move left the structure untouched.
        assert_eq!(store.get_topic(a).unwrap().unwrap().parent_id, None);
    }

    #[test]
    fn set_parent_is_idempotent() {
        let mut store = Store::open_in_memory().unwrap();
        let a = topic(&mut store, "A", None);
        let b = topic(&mut store, "B", None);

        let mut taxonomy = TopicTaxonomy::new(&mut store);
        taxonomy.set_parent(b, Some(a)).unwrap();
        taxonomy.set_parent(b, Some(a)).unwrap();

        let forest = taxonomy.tree(false).unwrap();
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].children.len(), 1);
        assert_eq!(store.get_topic(b).unwrap().unwrap().parent_id, Some(a));
    }

    #[test]
    fn set_parent_none_moves_to_root() {
        let mut store = Store::open_in_memory().unwrap();
        let a = topic(&mut store, "A", None);
        let b = topic(&mut store, "B", Some(a));
        let mut taxonomy = TopicTaxonomy::new(&mut store);
        taxonomy.set_parent(b, None).unwrap();
        assert_eq!(store.get_topic(b).unwrap().unwrap().parent_id, None);
    }

    #[test]
    fn delete_removes_subtree_and_clears_note_pointers() {
        let mut store = Store::open_in_memory().unwrap();
        let root = topic(&mut store, "A", None);
        let b = topic(&mut store, "B", Some(root));
        let c = topic(&mut store, "C", Some(b));
        let other = topic(&mut store, "Other", None);

        note(&mut store, "in subtree", Some(c), &[b]);
        note(&mut store, "outside", Some(other), &[]);

        let removed = TopicTaxonomy::new(&mut store).delete(root).unwrap();
        assert_eq!(removed, 3);
        assert!(store.get_topic(root).unwrap().is_none());
        assert!(store.get_topic(c).unwrap().is_none());
        assert!(store.get_topic(other).unwrap().is_some());

        let notes = store.list_notes().unwrap();
        let in_subtree = notes.iter().find(|n| n.title() == "in subtree").unwrap();
        assert_eq!(in_subtree.primary_topic_id(), None);
        assert!(store.note_secondary_topics(in_subtree.id()).unwrap().is_empty());

        let outside = notes.iter().find(|n| n.title() == "outside").unwrap();
        assert_eq!(outside.primary_topic_id(), Some(other));
    }
}
