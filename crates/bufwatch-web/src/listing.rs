#![forbid(unsafe_code)]

//! Relation listing JSON (`GET /api/relations`).
//!
//! The endpoint returns an array of rows:
//!
//! ```json
//! [{"oid": 16397, "relname": "pgbench_accounts", "total_blocks": 1640,
//!   "relfilenode": 16397, "relkind": "r"}]
//! ```
//!
//! Entities are keyed by `relfilenode`, since that is what trace frames carry.
//! Rows without a physical file (`relfilenode == 0`) are skipped and block
//! counts below 1 are raised to 1. A missing `relkind` is read as a plain
//! table; older servers omit it.

use std::collections::HashSet;
use std::fmt;

use bufwatch_core::{Entity, EntityId, EntityKind, EntitySource, ListError};
use serde::{Deserialize, Serialize};

/// One row as sent by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationRecord {
    pub oid: u32,
    pub relname: String,
    /// `pg_class.relpages`; may be 0 (or stale negative) for fresh relations.
    pub total_blocks: i64,
    pub relfilenode: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relkind: Option<String>,
}

impl RelationRecord {
    /// Convert to an [`Entity`], or `None` for rows without a physical file.
    pub fn into_entity(self) -> Result<Option<Entity>, ListingError> {
        if self.relfilenode == 0 {
            return Ok(None);
        }
        let kind = match self.relkind.as_deref() {
            None => EntityKind::Table,
            Some(code) => parse_relkind(code).ok_or_else(|| ListingError::UnknownRelkind {
                relname: self.relname.clone(),
                relkind: code.to_owned(),
            })?,
        };
        let total_blocks = u32::try_from(self.total_blocks.max(1)).unwrap_or(u32::MAX);
        Ok(Some(Entity::new(
            EntityId(self.relfilenode),
            self.oid,
            self.relname,
            kind,
            total_blocks,
        )))
    }
}

fn parse_relkind(code: &str) -> Option<EntityKind> {
    let mut chars = code.chars();
    let first = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    EntityKind::from_relkind(first)
}

/// The listing body could not be turned into entities.
#[derive(Debug)]
pub enum ListingError {
    /// Not a JSON array of relation rows.
    Json(serde_json::Error),
    /// A row carries a `relkind` the viewer does not display.
    UnknownRelkind { relname: String, relkind: String },
}

impl fmt::Display for ListingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid relation listing: {err}"),
            Self::UnknownRelkind { relname, relkind } => {
                write!(f, "relation {relname:?} has unsupported relkind {relkind:?}")
            }
        }
    }
}

impl std::error::Error for ListingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::UnknownRelkind { .. } => None,
        }
    }
}

impl From<serde_json::Error> for ListingError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<ListingError> for ListError {
    fn from(err: ListingError) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Parse a listing body into entities, in listing order.
///
/// Duplicate `relfilenode`s keep their first row.
pub fn parse_listing(json: &str) -> Result<Vec<Entity>, ListingError> {
    let records: Vec<RelationRecord> = serde_json::from_str(json)?;
    let mut seen = HashSet::with_capacity(records.len());
    let mut entities = Vec::with_capacity(records.len());
    for record in records {
        let Some(entity) = record.into_entity()? else {
            continue;
        };
        if !seen.insert(entity.id) {
            tracing::debug!(
                id = %entity.id,
                name = %entity.name,
                "duplicate relfilenode in listing"
            );
            continue;
        }
        entities.push(entity);
    }
    Ok(entities)
}

/// Serialize entities back into the listing shape (fixtures, replay tools).
pub fn to_listing_json(entities: &[Entity]) -> Result<String, ListingError> {
    let records: Vec<RelationRecord> = entities
        .iter()
        .map(|entity| RelationRecord {
            oid: entity.oid,
            relname: entity.name.clone(),
            total_blocks: i64::from(entity.total_blocks),
            relfilenode: entity.id.0,
            relkind: Some(entity.kind.relkind().to_string()),
        })
        .collect();
    Ok(serde_json::to_string(&records)?)
}

/// [`EntitySource`] over a listing body the host already fetched.
///
/// Each call parses the current body; hosts swap in a new one with
/// [`set_body`](Self::set_body) after every fetch.
#[derive(Debug, Clone, Default)]
pub struct JsonListing {
    body: String,
}

impl JsonListing {
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}

impl EntitySource for JsonListing {
    fn list_entities(&mut self) -> Result<Vec<Entity>, ListError> {
        Ok(parse_listing(&self.body)?)
    }
}
