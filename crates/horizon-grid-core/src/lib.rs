//! Core systems for Horizon Grid.
//!
//! This crate provides the foundation shared by the grid engine:
//!
//! - **Signal/Slot System**: Type-safe notifications for grid events
//! - **Logging**: `tracing` targets, span names and performance spans
//!
//! # Signal Example
//!
//! ```
//! use horizon_grid_core::Signal;
//!
//! let selection_changed = Signal::<usize>::new();
//! let conn_id = selection_changed.connect(|ranges| {
//!     println!("{ranges} ranges selected");
//! });
//! selection_changed.emit(2);
//! selection_changed.disconnect(conn_id);
//! ```

pub mod logging;
pub mod signal;

pub use logging::PerfSpan;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
