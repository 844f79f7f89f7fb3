//! The grid engine.
//!
//! [`GridEngine`] is a cheaply cloneable handle owning the data model, row
//! view, viewport, selection, UI state, history and event signals of one
//! grid. All state lives behind a single lock that is released before any
//! adapter call is awaited and before any signal is emitted, so slots may
//! call back into the engine and independent persistence calls may
//! interleave.
//!
//! ```
//! use horizon_grid::GridEngine;
//! use horizon_grid::model::{Column, Row};
//!
//! let engine = GridEngine::builder()
//!     .data(
//!         vec![Column::new("name", "Name"), Column::new("amount", "Amount").with_type("number")],
//!         vec![Row::new("1").with_value("name", "Ada").with_value("amount", 100)],
//!     )
//!     .build()
//!     .unwrap();
//! assert_eq!(engine.row_count(), 1);
//! ```

mod columns;
mod data;
mod interaction;
mod state;
mod view;

use std::sync::{Arc, Weak};

use horizon_grid_core::logging::targets;
use parking_lot::Mutex;

use crate::adapter::PersistenceAdapter;
use crate::config::GridConfig;
use crate::error::{ErrorEvent, GridError, Operation, Result};
use crate::events::GridEvents;
use crate::history::{Command, History, HistoryState};
use crate::hooks::LifecycleHooks;
use crate::input::{ApproxTextMeasurer, TextMeasurer};
use crate::menu::MenuItemProvider;
use crate::model::{Column, DataModel, Row};
use crate::registry::CellTypeRegistry;

pub(crate) use state::GridState;

/// Shared engine internals.
pub(crate) struct EngineInner {
    state: Mutex<GridState>,
    adapter: Option<Arc<dyn PersistenceAdapter>>,
    pub(crate) hooks: LifecycleHooks,
    pub(crate) registry: CellTypeRegistry,
    pub(crate) measurer: Box<dyn TextMeasurer>,
    pub(crate) menu_providers: Vec<Box<dyn MenuItemProvider>>,
    pub(crate) history: History,
    pub(crate) events: GridEvents,
    pub(crate) config: GridConfig,
}

impl EngineInner {
    /// Run `f` with the state locked. The guard never escapes `f`.
    ///
    /// A menu dismissed by a scroll change inside `f` is announced once the
    /// lock is released.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut GridState) -> R) -> R {
        let (result, menu_closed) = {
            let mut state = self.state.lock();
            let result = f(&mut state);
            (result, std::mem::take(&mut state.menu_dismissed))
        };
        if menu_closed {
            self.events.menu_closed.emit(());
        }
        result
    }

    pub(crate) fn adapter(&self) -> Option<&dyn PersistenceAdapter> {
        self.adapter.as_deref()
    }

    pub(crate) fn request_repaint(&self) {
        self.events.repaint_requested.emit(());
    }

    /// Log a failed operation and publish it through the `error` event.
    pub(crate) fn report(&self, operation: Operation, error: &GridError) {
        tracing::warn!(target: targets::ENGINE, %operation, %error, "operation failed");
        self.events.error.emit(ErrorEvent::from_error(operation, error));
    }

    pub(crate) fn emit_selection(&self) {
        let ranges = self.with_state(|state| state.selection.ranges().to_vec());
        self.events.selection_changed.emit(ranges);
    }

    pub(crate) fn emit_history(&self) {
        self.events.history_changed.emit(self.history.state());
    }
}

/// Builder for [`GridEngine`].
pub struct GridEngineBuilder {
    config: GridConfig,
    adapter: Option<Arc<dyn PersistenceAdapter>>,
    hooks: LifecycleHooks,
    registry: CellTypeRegistry,
    measurer: Box<dyn TextMeasurer>,
    menu_providers: Vec<Box<dyn MenuItemProvider>>,
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Default for GridEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GridEngineBuilder {
    /// A builder with default configuration, no adapter and no data.
    pub fn new() -> Self {
        Self {
            config: GridConfig::default(),
            adapter: None,
            hooks: LifecycleHooks::default(),
            registry: CellTypeRegistry::with_defaults(),
            measurer: Box::new(ApproxTextMeasurer::default()),
            menu_providers: Vec::new(),
            columns: Vec::new(),
            rows: Vec::new(),
        }
    }

    pub fn config(mut self, config: GridConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the persistence adapter.
    pub fn adapter(mut self, adapter: impl PersistenceAdapter + 'static) -> Self {
        self.adapter = Some(Arc::new(adapter));
        self
    }

    /// Set a shared persistence adapter.
    pub fn shared_adapter(mut self, adapter: Arc<dyn PersistenceAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn registry(mut self, registry: CellTypeRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Set the measurer used by column auto-fit.
    pub fn text_measurer(mut self, measurer: impl TextMeasurer + 'static) -> Self {
        self.measurer = Box::new(measurer);
        self
    }

    /// Add a context menu item provider. Providers are consulted in order.
    pub fn menu_provider(mut self, provider: impl MenuItemProvider + 'static) -> Self {
        self.menu_providers.push(Box::new(provider));
        self
    }

    /// Initial data, shown until the first [`GridEngine::load`].
    pub fn data(mut self, columns: Vec<Column>, rows: Vec<Row>) -> Self {
        self.columns = columns;
        self.rows = rows;
        self
    }

    /// Validate the configuration and create the engine.
    pub fn build(self) -> Result<GridEngine> {
        self.config.validate()?;
        let model = DataModel::with_data(self.columns, self.rows);
        let state = GridState::new(&self.config, model);
        tracing::debug!(
            target: targets::ENGINE,
            rows = state.model.row_count(),
            columns = state.model.column_count(),
            has_adapter = self.adapter.is_some(),
            "grid engine created"
        );
        Ok(GridEngine {
            inner: Arc::new(EngineInner {
                state: Mutex::new(state),
                adapter: self.adapter,
                hooks: self.hooks,
                registry: self.registry,
                measurer: self.measurer,
                menu_providers: self.menu_providers,
                history: History::new(self.config.history_capacity),
                events: GridEvents::default(),
                config: self.config,
            }),
        })
    }
}

/// Handle to a grid engine. Clones share the same grid.
#[derive(Clone)]
pub struct GridEngine {
    inner: Arc<EngineInner>,
}

impl std::fmt::Debug for GridEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (rows, columns) = self
            .inner
            .with_state(|state| (state.model.row_count(), state.model.column_count()));
        f.debug_struct("GridEngine")
            .field("rows", &rows)
            .field("columns", &columns)
            .field("history", &self.inner.history)
            .finish()
    }
}

/// Weak handle held by commands so the history never keeps an engine alive.
#[derive(Clone)]
pub(crate) struct WeakEngine(Weak<EngineInner>);

impl WeakEngine {
    pub(crate) fn upgrade(&self) -> Result<GridEngine> {
        self.0
            .upgrade()
            .map(|inner| GridEngine { inner })
            .ok_or(GridError::EngineDropped)
    }
}

impl GridEngine {
    /// Start building an engine.
    pub fn builder() -> GridEngineBuilder {
        GridEngineBuilder::new()
    }

    /// Outward event signals.
    pub fn events(&self) -> &GridEvents {
        &self.inner.events
    }

    pub fn config(&self) -> &GridConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &CellTypeRegistry {
        &self.inner.registry
    }

    pub fn has_adapter(&self) -> bool {
        self.inner.adapter.is_some()
    }

    pub(crate) fn downgrade(&self) -> WeakEngine {
        WeakEngine(Arc::downgrade(&self.inner))
    }

    // -------------------------------------------------------------------------
    // History
    // -------------------------------------------------------------------------

    /// Run a command and record it for undo.
    pub async fn execute(&self, command: Box<dyn Command>) -> Result<()> {
        let result = self.inner.history.execute(command).await;
        self.inner.emit_history();
        result
    }

    /// Undo the most recent command. Returns `false` if there was none.
    pub async fn undo(&self) -> Result<bool> {
        let result = self.inner.history.undo().await;
        self.inner.emit_history();
        result
    }

    /// Redo the most recently undone command. Returns `false` if there was none.
    pub async fn redo(&self) -> Result<bool> {
        let result = self.inner.history.redo().await;
        self.inner.emit_history();
        result
    }

    pub fn can_undo(&self) -> bool {
        self.inner.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.inner.history.can_redo()
    }

    pub fn history_state(&self) -> HistoryState {
        self.inner.history.state()
    }

    /// Drop every recorded command.
    pub fn clear_history(&self) {
        self.inner.history.clear();
        self.inner.emit_history();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn test_build_rejects_invalid_config() {
        let config = GridConfig {
            history_capacity: 0,
            ..GridConfig::default()
        };
        let err = GridEngine::builder().config(config).build().unwrap_err();
        assert!(matches!(err, GridError::Config(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_weak_engine_reports_drop() {
        let engine = GridEngine::builder().build().unwrap();
        let weak = engine.downgrade();
        assert!(weak.upgrade().is_ok());
        drop(engine);
        assert!(matches!(weak.upgrade(), Err(GridError::EngineDropped)));
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<GridEngine>();
    }
}
