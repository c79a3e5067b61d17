#![forbid(unsafe_code)]

//! Monitored relations.

use std::fmt;

/// Stable identity of a monitored relation.
///
/// This is the relation's on-disk file node number, which is what the trace
/// producer reports, not the catalog OID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u32> for EntityId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// Relation kind, as reported by the catalog's `relkind` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Ordinary heap table (`r`).
    Table,
    /// Partitioned table parent (`p`).
    PartitionedTable,
    /// Index (`i`).
    Index,
    /// Partitioned index parent (`I`).
    PartitionedIndex,
}

impl EntityKind {
    /// Parse a catalog `relkind` code. Other kinds are not monitored.
    #[must_use]
    pub const fn from_relkind(code: char) -> Option<Self> {
        match code {
            'r' => Some(Self::Table),
            'p' => Some(Self::PartitionedTable),
            'i' => Some(Self::Index),
            'I' => Some(Self::PartitionedIndex),
            _ => None,
        }
    }

    #[must_use]
    pub const fn relkind(self) -> char {
        match self {
            Self::Table => 'r',
            Self::PartitionedTable => 'p',
            Self::Index => 'i',
            Self::PartitionedIndex => 'I',
        }
    }

    #[must_use]
    pub const fn is_index(self) -> bool {
        matches!(self, Self::Index | Self::PartitionedIndex)
    }

    #[must_use]
    pub const fn is_table(self) -> bool {
        !self.is_index()
    }
}

/// A listed relation: identity, display name, kind, and size in blocks.
///
/// Immutable for a given listing snapshot; a new listing replaces it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    pub id: EntityId,
    /// Catalog OID (display only).
    pub oid: u32,
    pub name: String,
    pub kind: EntityKind,
    pub total_blocks: u32,
}

impl Entity {
    #[must_use]
    pub fn new(
        id: EntityId,
        oid: u32,
        name: impl Into<String>,
        kind: EntityKind,
        total_blocks: u32,
    ) -> Self {
        Self {
            id,
            oid,
            name: name.into(),
            kind,
            total_blocks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relkind_codes_round_trip() {
        for code in ['r', 'p', 'i', 'I'] {
            let kind = EntityKind::from_relkind(code).unwrap();
            assert_eq!(kind.relkind(), code);
        }
        assert_eq!(EntityKind::from_relkind('v'), None);
        assert_eq!(EntityKind::from_relkind('t'), None);
    }

    #[test]
    fn index_classification() {
        assert!(EntityKind::Index.is_index());
        assert!(EntityKind::PartitionedIndex.is_index());
        assert!(EntityKind::Table.is_table());
        assert!(EntityKind::PartitionedTable.is_table());
    }
}
