#![forbid(unsafe_code)]

//! Listed relations and the user's selection.
//!
//! Refreshing replaces the listing wholesale and prunes the selection to ids
//! that are still listed. It never selects anything new; choosing the initial
//! selection ([`EntityRegistry::select_all`] on first load) is a separate step
//! taken by the caller.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::entity::{Entity, EntityId};

/// Listing fetch failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListError {
    /// The metadata endpoint could not be reached or returned an error status.
    Unavailable(String),
    /// The response could not be understood.
    Malformed(String),
}

impl fmt::Display for ListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable(msg) => write!(f, "relation listing unavailable: {msg}"),
            Self::Malformed(msg) => write!(f, "malformed relation listing: {msg}"),
        }
    }
}

impl std::error::Error for ListError {}

/// Source of the current relation listing (the metadata endpoint).
pub trait EntitySource {
    /// Fetch the complete current listing.
    fn list_entities(&mut self) -> Result<Vec<Entity>, ListError>;
}

impl<F> EntitySource for F
where
    F: FnMut() -> Result<Vec<Entity>, ListError>,
{
    fn list_entities(&mut self) -> Result<Vec<Entity>, ListError> {
        self()
    }
}

/// What changed in a refresh.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Ids listed now but not before.
    pub added: Vec<EntityId>,
    /// Ids listed before but not now.
    pub removed: Vec<EntityId>,
    /// Removed ids that were selected (subset of `removed`).
    pub deselected: Vec<EntityId>,
    /// Ids listed before and now whose block count changed.
    pub resized: Vec<EntityId>,
}

impl RefreshOutcome {
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.resized.is_empty()
    }
}

/// Set of relation ids eligible for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<EntityId>,
}

impl Selection {
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Selected ids in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.ids.iter().copied()
    }
}

/// The current listing plus the selection over it.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: Vec<Entity>,
    index: HashMap<EntityId, usize>,
    selection: Selection,
}

impl EntityRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch from `source` and replace the listing.
    ///
    /// On error nothing changes: the previous listing and selection stay.
    pub fn refresh<E: EntitySource + ?Sized>(
        &mut self,
        source: &mut E,
    ) -> Result<RefreshOutcome, ListError> {
        let entities = source.list_entities()?;
        Ok(self.replace(entities))
    }

    /// Replace the listing with `entities` and prune the selection.
    ///
    /// Duplicate ids keep their first occurrence.
    pub fn replace(&mut self, entities: Vec<Entity>) -> RefreshOutcome {
        let mut fresh = Vec::with_capacity(entities.len());
        let mut index = HashMap::with_capacity(entities.len());
        for entity in entities {
            if index.contains_key(&entity.id) {
                tracing::debug!(
                    id = %entity.id,
                    name = %entity.name,
                    "duplicate relation in listing"
                );
                continue;
            }
            index.insert(entity.id, fresh.len());
            fresh.push(entity);
        }

        let mut outcome = RefreshOutcome::default();
        for entity in &fresh {
            match self.entity(entity.id) {
                None => outcome.added.push(entity.id),
                Some(previous) if previous.total_blocks != entity.total_blocks => {
                    outcome.resized.push(entity.id);
                }
                Some(_) => {}
            }
        }
        for entity in &self.entities {
            if !index.contains_key(&entity.id) {
                outcome.removed.push(entity.id);
                if self.selection.ids.remove(&entity.id) {
                    outcome.deselected.push(entity.id);
                }
            }
        }

        self.entities = fresh;
        self.index = index;
        // Ids that were selected but never listed (toggled before a listing
        // arrived) cannot survive a refresh either.
        let index = &self.index;
        self.selection.ids.retain(|id| index.contains_key(id));

        tracing::debug!(
            listed = self.entities.len(),
            added = outcome.added.len(),
            removed = outcome.removed.len(),
            deselected = outcome.deselected.len(),
            "relation listing replaced"
        );
        outcome
    }

    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.index.get(&id).map(|&i| &self.entities[i])
    }

    /// All listed relations, in listing order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Tables (plain and partitioned), sorted by name.
    #[must_use]
    pub fn tables(&self) -> Vec<&Entity> {
        self.sorted_by_name(|entity| entity.kind.is_table())
    }

    /// Indexes (plain and partitioned), sorted by name.
    #[must_use]
    pub fn indexes(&self) -> Vec<&Entity> {
        self.sorted_by_name(|entity| entity.kind.is_index())
    }

    fn sorted_by_name(&self, keep: impl Fn(&Entity) -> bool) -> Vec<&Entity> {
        let mut out: Vec<&Entity> = self.entities.iter().filter(|e| keep(e)).collect();
        out.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        out
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn is_selected(&self, id: EntityId) -> bool {
        self.selection.contains(id)
    }

    /// Selected relations, in listing order.
    pub fn selected_entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities
            .iter()
            .filter(|entity| self.selection.contains(entity.id))
    }

    /// Flip membership of `id`. Returns the new membership.
    ///
    /// Unlisted ids cannot be selected; toggling one returns `false`.
    pub fn toggle(&mut self, id: EntityId) -> bool {
        if self.selection.ids.remove(&id) {
            return false;
        }
        self.select(id)
    }

    /// Select a listed id. Returns whether it is selected afterwards.
    pub fn select(&mut self, id: EntityId) -> bool {
        if !self.index.contains_key(&id) {
            return false;
        }
        self.selection.ids.insert(id);
        true
    }

    /// Deselect `id`. Returns whether it was selected.
    pub fn deselect(&mut self, id: EntityId) -> bool {
        self.selection.ids.remove(&id)
    }

    /// Select every listed relation. Returns the ids that were newly selected.
    pub fn select_all(&mut self) -> Vec<EntityId> {
        let mut newly = Vec::new();
        for entity in &self.entities {
            if self.selection.ids.insert(entity.id) {
                newly.push(entity.id);
            }
        }
        newly
    }

    /// Deselect everything. Returns the ids that were selected.
    pub fn clear_selection(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.selection.ids).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;

    fn rel(id: u32, name: &str, kind: EntityKind, blocks: u32) -> Entity {
        Entity::new(EntityId(id), id + 10_000, name, kind, blocks)
    }

    fn listing() -> Vec<Entity> {
        vec![
            rel(3, "orders", EntityKind::Table, 40),
            rel(1, "accounts", EntityKind::Table, 10),
            rel(7, "orders_pkey", EntityKind::Index, 4),
            rel(5, "accounts_pkey", EntityKind::Index, 2),
            rel(9, "events", EntityKind::PartitionedTable, 1),
        ]
    }

    #[test]
    fn refresh_selects_nothing() {
        let mut registry = EntityRegistry::new();
        let outcome = registry.replace(listing());
        assert_eq!(outcome.added.len(), 5);
        assert!(registry.selection().is_empty());

        let newly = registry.select_all();
        assert_eq!(newly.len(), 5);
        assert_eq!(registry.selection().len(), 5);
        assert!(registry.select_all().is_empty());
    }

    #[test]
    fn refresh_prunes_selection_to_intersection() {
        let mut registry = EntityRegistry::new();
        registry.replace(listing());
        registry.select_all();
        registry.toggle(EntityId(1));

        let mut next = listing();
        next.retain(|e| e.id != EntityId(3) && e.id != EntityId(1));
        next.push(rel(11, "audit", EntityKind::Table, 3));
        let outcome = registry.replace(next);

        assert_eq!(outcome.added, vec![EntityId(11)]);
        assert_eq!(outcome.removed, vec![EntityId(3), EntityId(1)]);
        assert_eq!(outcome.deselected, vec![EntityId(3)]);
        assert!(!registry.is_selected(EntityId(3)));
        assert!(!registry.is_selected(EntityId(11)));
        assert!(registry.is_selected(EntityId(7)));
    }

    #[test]
    fn refresh_reports_resized() {
        let mut registry = EntityRegistry::new();
        registry.replace(listing());
        let mut next = listing();
        next[0].total_blocks = 41;
        let outcome = registry.replace(next);
        assert_eq!(outcome.resized, vec![EntityId(3)]);
        assert!(outcome.added.is_empty() && outcome.removed.is_empty());
    }

    #[test]
    fn failed_refresh_changes_nothing() {
        let mut registry = EntityRegistry::new();
        registry.replace(listing());
        registry.select_all();

        let mut failing = || -> Result<Vec<Entity>, ListError> {
            Err(ListError::Unavailable("connection refused".into()))
        };
        let err = registry.refresh(&mut failing).unwrap_err();
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.selection().len(), 5);
    }

    #[test]
    fn toggle_flips_and_ignores_unknown() {
        let mut registry = EntityRegistry::new();
        registry.replace(listing());
        assert!(registry.toggle(EntityId(7)));
        assert!(!registry.toggle(EntityId(7)));
        assert!(!registry.toggle(EntityId(404)));
        assert!(!registry.is_selected(EntityId(404)));
    }

    #[test]
    fn duplicates_keep_first() {
        let mut registry = EntityRegistry::new();
        let mut list = listing();
        list.push(rel(3, "orders_again", EntityKind::Table, 1));
        registry.replace(list);
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.entity(EntityId(3)).unwrap().name, "orders");
    }

    #[test]
    fn sidebar_grouping_is_sorted() {
        let mut registry = EntityRegistry::new();
        registry.replace(listing());
        let tables: Vec<&str> = registry.tables().iter().map(|e| e.name.as_str()).collect();
        let indexes: Vec<&str> = registry.indexes().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(tables, ["accounts", "events", "orders"]);
        assert_eq!(indexes, ["accounts_pkey", "orders_pkey"]);
    }

    #[test]
    fn selected_entities_follow_listing_order() {
        let mut registry = EntityRegistry::new();
        registry.replace(listing());
        registry.select(EntityId(5));
        registry.select(EntityId(3));
        let names: Vec<&str> = registry
            .selected_entities()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, ["orders", "accounts_pkey"]);
        assert_eq!(registry.clear_selection().len(), 2);
        assert!(registry.selection().is_empty());
    }
}
