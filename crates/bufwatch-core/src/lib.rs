#![forbid(unsafe_code)]

//! Host-agnostic engine for live buffer-access visualization.
//!
//! `bufwatch-core` turns a stream of block-access trace frames into paint
//! calls on per-relation grids. Each monitored relation (table or index) is a
//! grid of small cells, one per storage block; a trace event lights a cell up
//! and the cell fades back to neutral after a fixed dwell window.
//!
//! # Primary responsibilities
//!
//! - **Frame**: stateless binary codec for trace frames (plus the producer's
//!   hex-record text format).
//! - **Registry**: the listed relations and the user's selection set.
//! - **Grid**: block → cell addressing and the initial neutral paint.
//! - **Decay**: per-cell highlight records with cancellable deadlines.
//! - **Session**: the single owning context tying the pieces together for one
//!   client, including the connection state machine.
//!
//! # Design principles
//!
//! - **No I/O**: the host supplies frames, listings, surfaces, and time.
//! - **Single timeline**: admission and expiry run on the caller's thread; no
//!   locks, no background tasks.
//! - **Deterministic**: with a [`clock::DeterministicClock`], identical inputs
//!   always produce identical paint sequences.

pub mod canvas;
pub mod clock;
pub mod color;
pub mod config;
pub mod connection;
pub mod decay;
pub mod entity;
pub mod frame;
pub mod grid;
pub mod logging;
pub mod registry;
pub mod session;
pub mod surface;
pub mod trace;

pub use canvas::{Canvas, CanvasSet};
pub use clock::{Clock, DeterministicClock, MonotonicClock};
pub use color::{Palette, Rgba};
pub use config::{Config, ConfigError};
pub use connection::{ConnectionState, ConnectionStatus};
pub use decay::{Admission, CellKey, CellState, DecayEngine, DecayStats, DropReason};
pub use entity::{Entity, EntityId, EntityKind};
pub use frame::{FrameError, decode_frame, encode_frame, parse_hex_record};
pub use grid::{CellPosition, GridGeometry, GridLayout, LayoutError};
pub use registry::{EntityRegistry, EntitySource, ListError, RefreshOutcome, Selection};
pub use session::{MountError, Session, TeardownReport};
pub use surface::{PaintOp, PixelRect, PixelSurface, Surface};
pub use trace::{Access, TraceEvent};
