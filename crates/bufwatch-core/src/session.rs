#![forbid(unsafe_code)]

//! Per-client session: the single owner of listing, selection, mounted
//! surfaces, highlight records, and connection state.
//!
//! # Lifecycle
//!
//! 1. [`Session::new`] on mount of the viewer.
//! 2. [`Session::refresh`] (or [`Session::replace_entities`]) with the
//!    listing, then [`Session::select_all`] on first load.
//! 3. [`Session::mount`] a surface for each selected relation.
//! 4. [`Session::connection_opened`], then [`Session::on_frame`] per frame
//!    and [`Session::tick`] per display frame.
//! 5. [`Session::teardown`] (or drop) on unmount.
//!
//! Everything runs on the caller's thread, in call order.

use std::fmt;

use crate::canvas::{Canvas, CanvasSet};
use crate::clock::Clock;
use crate::config::Config;
use crate::connection::{ConnectionState, ConnectionStatus};
use crate::decay::{Admission, DecayEngine};
use crate::entity::{Entity, EntityId};
use crate::frame::decode_frame;
use crate::grid::{self, GridGeometry, LayoutError};
use crate::registry::{EntityRegistry, EntitySource, ListError, RefreshOutcome};
use crate::surface::Surface;
use crate::trace::TraceEvent;

/// Mounting a surface failed. Only the affected relation is impacted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MountError {
    /// The id is not in the current listing.
    UnknownEntity(EntityId),
    /// The relation is listed but not selected.
    NotSelected(EntityId),
    /// The host could not provide a drawing context.
    SurfaceUnavailable(String),
    /// The surface cannot hold the grid.
    Layout(LayoutError),
}

impl fmt::Display for MountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownEntity(id) => write!(f, "relation {id} is not listed"),
            Self::NotSelected(id) => write!(f, "relation {id} is not selected"),
            Self::SurfaceUnavailable(msg) => write!(f, "drawing surface unavailable: {msg}"),
            Self::Layout(err) => write!(f, "cannot lay out grid: {err}"),
        }
    }
}

impl std::error::Error for MountError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LayoutError> for MountError {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

/// What [`Session::teardown`] released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub cancelled_decays: usize,
    pub released_surfaces: usize,
}

/// One viewer instance.
pub struct Session<S: Surface, C: Clock> {
    config: Config,
    registry: EntityRegistry,
    canvases: CanvasSet<S>,
    decay: DecayEngine,
    connection: ConnectionState,
    clock: C,
}

impl<S: Surface, C: Clock> fmt::Debug for Session<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("listed", &self.registry.len())
            .field("selected", &self.registry.selection().len())
            .field("mounted", &self.canvases.len())
            .field("lit", &self.decay.pending_len())
            .field("connection", &self.connection.status())
            .finish()
    }
}

impl<S: Surface, C: Clock> Session<S, C> {
    #[must_use]
    pub fn new(config: Config, clock: C) -> Self {
        let decay = DecayEngine::new(config.dwell, config.palette);
        Self {
            config,
            registry: EntityRegistry::new(),
            canvases: CanvasSet::new(),
            decay,
            connection: ConnectionState::new(),
            clock,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    #[must_use]
    pub fn canvases(&self) -> &CanvasSet<S> {
        &self.canvases
    }

    #[must_use]
    pub fn decay(&self) -> &DecayEngine {
        &self.decay
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Mutable access to the clock, for hosts that drive time explicitly.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    #[must_use]
    pub fn is_selected(&self, id: EntityId) -> bool {
        self.registry.is_selected(id)
    }

    /// Geometry of `id`'s mounted surface.
    #[must_use]
    pub fn geometry_for(&self, id: EntityId) -> Option<&GridGeometry> {
        self.canvases.geometry(id)
    }

    // -----------------------------------------------------------------------
    // Listing and selection
    // -----------------------------------------------------------------------

    /// Re-fetch the listing from `source`.
    ///
    /// On failure the previous listing, selection, and surfaces stay as they
    /// were and the error is returned for the host to display.
    pub fn refresh<E: EntitySource + ?Sized>(
        &mut self,
        source: &mut E,
    ) -> Result<RefreshOutcome, ListError> {
        match source.list_entities() {
            Ok(entities) => Ok(self.replace_entities(entities)),
            Err(err) => {
                tracing::warn!(%err, "relation listing failed; keeping previous listing");
                Err(err)
            }
        }
    }

    /// Replace the listing with an already fetched one.
    ///
    /// Relations that disappeared lose their surface and pending highlights.
    /// Mounted relations whose block count changed are re-initialized.
    pub fn replace_entities(&mut self, entities: Vec<Entity>) -> RefreshOutcome {
        let outcome = self.registry.replace(entities);
        for &id in &outcome.removed {
            self.retire(id);
        }
        for &id in &outcome.resized {
            if self.canvases.contains(id) {
                if let Err(err) = self.relayout(id) {
                    tracing::warn!(%id, %err, "re-initializing resized relation failed");
                }
            }
        }
        outcome
    }

    /// Select every listed relation; returns the newly selected ids, which
    /// the host should now mount surfaces for.
    pub fn select_all(&mut self) -> Vec<EntityId> {
        self.registry.select_all()
    }

    /// Flip selection of `id`. Deselecting releases its surface and cancels
    /// its pending highlights. Returns the new membership.
    pub fn toggle(&mut self, id: EntityId) -> bool {
        let selected = self.registry.toggle(id);
        if !selected {
            self.retire(id);
        }
        selected
    }

    fn retire(&mut self, id: EntityId) {
        self.decay.cancel_entity(id);
        if self.canvases.remove(id).is_some() {
            tracing::debug!(%id, "surface released");
        }
    }

    // -----------------------------------------------------------------------
    // Surfaces
    // -----------------------------------------------------------------------

    /// Initialize `surface` for `id` and start drawing events onto it.
    ///
    /// Any previous surface for `id` is released first, together with its
    /// pending highlights. On error `id` is left without a surface.
    pub fn mount(&mut self, id: EntityId, mut surface: S) -> Result<GridGeometry, MountError> {
        let total_blocks = match self.registry.entity(id) {
            Some(entity) => entity.total_blocks,
            None => return Err(MountError::UnknownEntity(id)),
        };
        if !self.registry.is_selected(id) {
            return Err(MountError::NotSelected(id));
        }
        self.retire(id);

        let geometry =
            grid::initialize(&mut surface, self.config.layout, &self.config.palette, total_blocks)
                .inspect_err(|err| tracing::warn!(%id, %err, "mount failed"))?;
        self.canvases.insert(id, Canvas::new(surface, geometry));
        tracing::debug!(
            %id,
            total_blocks,
            blocks_per_row = geometry.blocks_per_row(),
            height = geometry.surface_height(),
            "surface mounted"
        );
        Ok(geometry)
    }

    /// Re-run layout on `id`'s mounted surface (its width or the relation's
    /// block count changed). Pending highlights for `id` are cancelled since
    /// the repaint resets every cell.
    pub fn relayout(&mut self, id: EntityId) -> Result<GridGeometry, MountError> {
        let canvas = self.canvases.remove(id).ok_or_else(|| {
            MountError::SurfaceUnavailable(format!("relation {id} has no surface"))
        })?;
        self.mount(id, canvas.into_surface())
    }

    /// Release `id`'s surface back to the host.
    pub fn unmount(&mut self, id: EntityId) -> Option<S> {
        self.decay.cancel_entity(id);
        let canvas = self.canvases.remove(id)?;
        tracing::debug!(%id, "surface unmounted");
        Some(canvas.into_surface())
    }

    // -----------------------------------------------------------------------
    // Stream
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    #[must_use]
    pub fn connection_status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn connection_opened(&mut self) {
        if self.connection.open(self.clock.now()) {
            tracing::info!("trace stream connected");
        }
    }

    /// Stop admitting frames. Already lit cells still fade out on `tick`.
    pub fn connection_closed(&mut self) {
        if self.connection.close() {
            tracing::info!(
                accepted = self.connection.frames_accepted(),
                rejected = self.connection.frames_rejected(),
                "trace stream disconnected"
            );
        }
    }

    /// Start a new connection attempt after a close.
    pub fn connection_retrying(&mut self) -> bool {
        self.connection.reconnect()
    }

    /// Decode and admit one binary frame.
    ///
    /// Returns `None` when the frame was not admitted at all: the connection
    /// is not open, or the frame is malformed (logged and dropped).
    pub fn on_frame(&mut self, bytes: &[u8]) -> Option<Admission> {
        if !self.connection.is_open() {
            return None;
        }
        match decode_frame(bytes) {
            Ok(event) => {
                self.connection.record_accepted();
                Some(self.on_event(event))
            }
            Err(err) => {
                self.connection.record_rejected();
                tracing::warn!(%err, len = bytes.len(), "dropping malformed trace frame");
                None
            }
        }
    }

    /// Admit an already decoded event at the current clock time.
    pub fn on_event(&mut self, event: TraceEvent) -> Admission {
        let now = self.clock.now();
        self.decay
            .admit(event, now, self.registry.selection(), &mut self.canvases)
    }

    /// Clear every highlight whose dwell has elapsed. Call once per display
    /// frame (or at [`next_deadline`](Self::next_deadline)).
    pub fn tick(&mut self) -> usize {
        let now = self.clock.now();
        self.decay.expire(now, &mut self.canvases)
    }

    /// Earliest pending clear, in clock time.
    #[must_use]
    pub fn next_deadline(&mut self) -> Option<std::time::Duration> {
        self.decay.next_deadline()
    }

    // -----------------------------------------------------------------------
    // Teardown
    // -----------------------------------------------------------------------

    /// Cancel all pending highlights and release every surface.
    pub fn teardown(mut self) -> TeardownReport {
        self.shutdown()
    }

    fn shutdown(&mut self) -> TeardownReport {
        self.connection.close();
        let report = TeardownReport {
            cancelled_decays: self.decay.cancel_all(),
            released_surfaces: self.canvases.clear(),
        };
        if report != TeardownReport::default() {
            tracing::info!(
                cancelled = report.cancelled_decays,
                released = report.released_surfaces,
                "session torn down"
            );
        }
        report
    }
}

impl<S: Surface, C: Clock> Drop for Session<S, C> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
