#![forbid(unsafe_code)]

//! Highlight-and-decay engine.
//!
//! Every admitted trace event paints its cell in the access color and arms a
//! deadline `dwell` later. When the deadline passes with no newer event for
//! the same cell, the cell is repainted neutral.
//!
//! # Design
//!
//! Each cell has at most one live record in `pending`, tagged with a
//! generation number unique to its activation. Deadlines sit in a min-heap of
//! `(deadline, generation, cell)`. A newer event for the same cell replaces
//! the record with a fresh generation; the old heap entry is left in place and
//! discarded when popped because its generation no longer matches. Cancelling
//! is therefore O(1) and an old deadline can never clear a cell that has been
//! lit again since.
//!
//! # State machine (per cell)
//!
//! ```text
//!            admit(access)              admit(access')
//!  Neutral ────────────────▶ Lit(access) ───────────────▶ Lit(access')  (deadline restarts)
//!     ▲                          │
//!     └──── expire (now >= deadline) / cancel (no paint) ─┘
//! ```
//!
//! # Invariants
//!
//! 1. At most one live record per `(entity, block)`.
//! 2. A cell is cleared no earlier than `dwell` after its latest activation.
//! 3. A superseded deadline never paints.
//! 4. Dropped events (not selected, no canvas) change no state and paint nothing.
//! 5. After [`DecayEngine::cancel_all`] no record remains, so `expire` paints nothing.
//!
//! # Failure Modes
//!
//! - Canvas unmounted while a record is live: the record is forgotten at its
//!   deadline without painting.
//! - Event storms on one hot cell grow the heap with stale entries; the heap is
//!   rebuilt from the live records once stale entries dominate.
//! - Blocks past the grid's `total_blocks` (stale listing) are tracked like any
//!   other and clear to background, not neutral.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use crate::canvas::CanvasSet;
use crate::color::Palette;
use crate::entity::EntityId;
use crate::registry::Selection;
use crate::surface::Surface;
use crate::trace::{Access, TraceEvent};

/// How long a cell stays lit after its latest activation.
pub const DEFAULT_DWELL: Duration = Duration::from_millis(500);

/// Stale heap entries tolerated before a rebuild.
const COMPACT_SLACK: usize = 4096;

/// One cell of one relation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub entity: EntityId,
    pub block: u32,
}

impl CellKey {
    #[must_use]
    pub const fn new(entity: EntityId, block: u32) -> Self {
        Self { entity, block }
    }
}

/// Visible state of a cell, as far as the engine knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Neutral,
    Lit(Access),
}

/// Why an event was not drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The relation is not in the selection.
    NotSelected,
    /// The relation is selected but has no mounted canvas yet (or any more).
    NoCanvas,
}

/// Result of admitting one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A neutral cell was lit.
    Lit,
    /// An already lit cell was repainted and its deadline restarted.
    Refreshed,
    /// Filtered out; nothing changed.
    Dropped(DropReason),
}

/// Counters since the engine was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecayStats {
    pub lit: u64,
    pub refreshed: u64,
    pub dropped: u64,
    pub expired: u64,
    pub cancelled: u64,
}

#[derive(Debug, Clone, Copy)]
struct PendingDecay {
    deadline: Duration,
    generation: u64,
    access: Access,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Expiry {
    deadline: Duration,
    generation: u64,
    key: CellKey,
}

/// Owner of all live highlight records.
#[derive(Debug)]
pub struct DecayEngine {
    dwell: Duration,
    palette: Palette,
    pending: HashMap<CellKey, PendingDecay>,
    queue: BinaryHeap<Reverse<Expiry>>,
    next_generation: u64,
    stats: DecayStats,
}

impl DecayEngine {
    #[must_use]
    pub fn new(dwell: Duration, palette: Palette) -> Self {
        Self {
            dwell,
            palette,
            pending: HashMap::new(),
            queue: BinaryHeap::new(),
            next_generation: 0,
            stats: DecayStats::default(),
        }
    }

    #[must_use]
    pub const fn dwell(&self) -> Duration {
        self.dwell
    }

    #[must_use]
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    #[must_use]
    pub const fn stats(&self) -> DecayStats {
        self.stats
    }

    /// Number of lit cells.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Lit cells belonging to `entity`.
    #[must_use]
    pub fn pending_for(&self, entity: EntityId) -> usize {
        self.pending.keys().filter(|key| key.entity == entity).count()
    }

    #[must_use]
    pub fn cell_state(&self, key: CellKey) -> CellState {
        self.pending
            .get(&key)
            .map_or(CellState::Neutral, |pending| CellState::Lit(pending.access))
    }

    /// Earliest live deadline, for hosts that schedule exact wakeups.
    ///
    /// Superseded heap entries on top of the queue are discarded on the way.
    pub fn next_deadline(&mut self) -> Option<Duration> {
        while let Some(Reverse(top)) = self.queue.peek() {
            if self.is_live(top) {
                return Some(top.deadline);
            }
            self.queue.pop();
        }
        None
    }

    fn is_live(&self, expiry: &Expiry) -> bool {
        self.pending
            .get(&expiry.key)
            .is_some_and(|pending| pending.generation == expiry.generation)
    }

    /// Admit one event at time `now`.
    ///
    /// Events for relations outside `selection`, or without a canvas in
    /// `canvases`, are dropped without touching any state.
    pub fn admit<S: Surface>(
        &mut self,
        event: TraceEvent,
        now: Duration,
        selection: &Selection,
        canvases: &mut CanvasSet<S>,
    ) -> Admission {
        if !selection.contains(event.entity) {
            self.stats.dropped += 1;
            return Admission::Dropped(DropReason::NotSelected);
        }
        let color = self.palette.access_color(event.access);
        if !canvases.paint_block(event.entity, event.block, color) {
            self.stats.dropped += 1;
            return Admission::Dropped(DropReason::NoCanvas);
        }

        let key = CellKey::new(event.entity, event.block);
        let generation = self.next_generation;
        self.next_generation += 1;
        let deadline = now.saturating_add(self.dwell);

        let previous = self.pending.insert(
            key,
            PendingDecay {
                deadline,
                generation,
                access: event.access,
            },
        );
        self.queue.push(Reverse(Expiry {
            deadline,
            generation,
            key,
        }));
        self.maybe_compact();

        tracing::trace!(
            entity = %event.entity,
            block = event.block,
            access = ?event.access,
            refreshed = previous.is_some(),
            "cell lit"
        );
        if previous.is_some() {
            self.stats.refreshed += 1;
            Admission::Refreshed
        } else {
            self.stats.lit += 1;
            Admission::Lit
        }
    }

    /// Clear every cell whose deadline is at or before `now`.
    ///
    /// Cells inside the grid go back to neutral. Blocks at or past the grid's
    /// `total_blocks` (stale listings) go back to background, so the unused
    /// tail of the last row keeps its initial look.
    ///
    /// Returns the number of cells repainted.
    pub fn expire<S: Surface>(&mut self, now: Duration, canvases: &mut CanvasSet<S>) -> usize {
        let mut cleared = 0;
        while self
            .queue
            .peek()
            .is_some_and(|Reverse(top)| top.deadline <= now)
        {
            let Some(Reverse(expiry)) = self.queue.pop() else {
                break;
            };
            if !self.is_live(&expiry) {
                continue;
            }
            self.pending.remove(&expiry.key);
            self.stats.expired += 1;
            let CellKey { entity, block } = expiry.key;
            let in_grid = canvases
                .geometry(entity)
                .is_none_or(|geometry| block < geometry.total_blocks());
            let color = if in_grid {
                self.palette.neutral
            } else {
                self.palette.background
            };
            if canvases.paint_block(entity, block, color) {
                cleared += 1;
            }
        }
        cleared
    }

    /// Drop every record for `entity` without painting.
    pub fn cancel_entity(&mut self, entity: EntityId) -> usize {
        let before = self.pending.len();
        self.pending.retain(|key, _| key.entity != entity);
        let cancelled = before - self.pending.len();
        self.stats.cancelled += cancelled as u64;
        if cancelled > 0 {
            tracing::debug!(%entity, cancelled, "pending decays cancelled");
        }
        cancelled
    }

    /// Drop every record without painting.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        self.queue.clear();
        self.stats.cancelled += cancelled as u64;
        cancelled
    }

    fn maybe_compact(&mut self) {
        if self.queue.len() <= self.pending.len().saturating_mul(2) + COMPACT_SLACK {
            return;
        }
        let live: Vec<Reverse<Expiry>> = self
            .pending
            .iter()
            .map(|(&key, pending)| {
                Reverse(Expiry {
                    deadline: pending.deadline,
                    generation: pending.generation,
                    key,
                })
            })
            .collect();
        self.queue = BinaryHeap::from(live);
    }
}

impl Default for DecayEngine {
    fn default() -> Self {
        Self::new(DEFAULT_DWELL, Palette::default())
    }
}
