#![forbid(unsafe_code)]

//! Decoded trace events.

use crate::entity::EntityId;

/// How the traced block access was served.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Access {
    /// Found in the shared buffer cache.
    Hit,
    /// Read in from storage.
    Miss,
    /// The producer did not classify the access.
    Unclassified,
}

impl Access {
    /// Map a wire hit flag (`1` = hit, `0` = miss).
    #[must_use]
    pub const fn from_flag(flag: u32) -> Option<Self> {
        match flag {
            0 => Some(Self::Miss),
            1 => Some(Self::Hit),
            _ => None,
        }
    }

    /// Wire hit flag, or `None` for unclassified accesses.
    #[must_use]
    pub const fn flag(self) -> Option<u32> {
        match self {
            Self::Hit => Some(1),
            Self::Miss => Some(0),
            Self::Unclassified => None,
        }
    }
}

/// One block access reported by the producer.
///
/// `block` is 0-based and not checked against the relation's listed size;
/// listings can be stale relative to the live stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TraceEvent {
    pub entity: EntityId,
    pub block: u32,
    pub access: Access,
}

impl TraceEvent {
    #[must_use]
    pub const fn new(entity: EntityId, block: u32, access: Access) -> Self {
        Self {
            entity,
            block,
            access,
        }
    }

    /// An event without hit/miss classification.
    #[must_use]
    pub const fn unclassified(entity: EntityId, block: u32) -> Self {
        Self::new(entity, block, Access::Unclassified)
    }
}
