//! Horizon Grid - the interaction and state core of a virtualized, editable,
//! spreadsheet-style data grid.
//!
//! The crate owns everything a grid does except drawing: the column/row
//! data model, the visual row order (sorting, grouping, collapse), viewport
//! virtualization, selection, pointer and keyboard gestures, inline editing,
//! context menus, undo/redo and optimistic persistence through a pluggable
//! [`PersistenceAdapter`](adapter::PersistenceAdapter). Hosts feed input
//! events in, draw the [`Frame`](render::Frame)s handed to their
//! [`RenderSurface`](render::RenderSurface) and listen to [`GridEvents`].
//!
//! # Example
//!
//! ```
//! use horizon_grid::prelude::*;
//!
//! # async fn demo() -> horizon_grid::Result<()> {
//! let adapter = MemoryAdapter::new(
//!     vec![Column::new("name", "Name"), Column::new("amount", "Amount").with_type("number")],
//!     vec![Row::new("1").with_value("name", "Ada").with_value("amount", 100)],
//! );
//! let engine = GridEngine::builder().adapter(adapter).build()?;
//! engine.events().error.connect(|event| eprintln!("{}", event.message));
//!
//! engine.load().await?;
//! engine.update_cell("1", "amount", 200).await?;
//! engine.undo().await?;
//! # Ok(())
//! # }
//! ```

pub mod adapter;
pub mod config;
pub mod error;
pub mod events;
pub mod geometry;
pub mod history;
pub mod hooks;
pub mod input;
pub mod menu;
pub mod model;
pub mod prelude;
pub mod registry;
pub mod render;
pub mod selection;
pub mod ui_state;
pub mod view;
pub mod viewport;

mod commands;
mod engine;
mod optimistic;

pub use config::GridConfig;
pub use engine::{GridEngine, GridEngineBuilder};
pub use error::{ErrorEvent, ErrorKind, GridError, Operation, Result};
pub use events::GridEvents;
pub use horizon_grid_core::{ConnectionGuard, ConnectionId, Signal};
