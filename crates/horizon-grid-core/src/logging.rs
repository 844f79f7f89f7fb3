//! Logging facilities for Horizon Grid.
//!
//! Horizon Grid uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("horizon_grid=debug")
//!     .init();
//! ```
//!
//! Every subsystem logs under its own target so hosts can filter, for
//! example, only gesture transitions (`horizon_grid::input`) or only
//! persistence round trips (`horizon_grid::engine`).

/// Span names used throughout Horizon Grid for tracing.
pub mod span_names {
    /// Full data load from the persistence adapter.
    pub const LOAD: &str = "horizon_grid::load";
    /// Row view rebuild (grouping, sorting).
    pub const VIEW_REBUILD: &str = "horizon_grid::view_rebuild";
    /// Frame snapshot for the render surface.
    pub const FRAME: &str = "horizon_grid::frame";
    /// Column auto-fit measurement.
    pub const AUTO_FIT: &str = "horizon_grid::auto_fit";
}

/// Target names for log filtering.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "horizon_grid_core";
    /// Signal emission target.
    pub const SIGNAL: &str = "horizon_grid_core::signal";
    /// Mutation orchestrator and persistence round trips.
    pub const ENGINE: &str = "horizon_grid::engine";
    /// Pointer/keyboard input and gesture transitions.
    pub const INPUT: &str = "horizon_grid::input";
    /// Undo/redo history.
    pub const HISTORY: &str = "horizon_grid::history";
    /// Row view ordering and grouping.
    pub const VIEW: &str = "horizon_grid::view";
    /// Viewport scrolling and virtualization.
    pub const VIEWPORT: &str = "horizon_grid::viewport";
    /// Configuration loading.
    pub const CONFIG: &str = "horizon_grid::config";
    /// Persistence adapters shipped with the crate.
    pub const ADAPTER: &str = "horizon_grid::adapter";
}

/// Performance tracing span guard.
///
/// The span is entered on creation and exited when the guard is dropped,
/// so the time spent in the enclosing scope is attributed to `name`.
///
/// ```
/// use horizon_grid_core::PerfSpan;
///
/// {
///     let _span = PerfSpan::new(horizon_grid_core::logging::span_names::VIEW_REBUILD);
///     // ... rebuild ...
/// }
/// ```
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create and enter a new performance span.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_grid::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// `tracing::trace!` under the core target. Used for slot bookkeeping.
#[macro_export]
macro_rules! grid_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "horizon_grid_core", $($arg)*)
    };
}

/// `tracing::debug!` under the core target.
#[macro_export]
macro_rules! grid_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "horizon_grid_core", $($arg)*)
    };
}
