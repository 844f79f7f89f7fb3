//! Undo/redo history.
//!
//! Every reversible mutation is a [`Command`]: an asynchronous execute/undo
//! pair that captured the state it needs when it was constructed. The
//! [`History`] keeps a bounded undo stack and a redo stack. Executing a new
//! command discards the redo stack.
//!
//! The stacks are guarded by a mutex that is only held while pushing or
//! popping, never while a command runs, so a command may itself call into
//! the engine.

use std::collections::VecDeque;
use std::future::Future;

use futures_util::future::{BoxFuture, FutureExt};
use horizon_grid_core::logging::targets;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default undo stack capacity.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// A reversible unit of work.
pub trait Command: Send + Sync {
    /// Short description, e.g. "Edit cell".
    fn label(&self) -> &str;

    /// Apply the change.
    fn execute(&self) -> BoxFuture<'_, Result<()>>;

    /// Revert the change.
    fn undo(&self) -> BoxFuture<'_, Result<()>>;
}

type CommandFn = Box<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// A command built from two closures.
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use horizon_grid::history::FnCommand;
///
/// let counter = Arc::new(AtomicI32::new(0));
/// let (up, down) = (counter.clone(), counter.clone());
/// let command = FnCommand::new(
///     "Increment",
///     move || {
///         let up = up.clone();
///         async move {
///             up.fetch_add(1, Ordering::SeqCst);
///             Ok(())
///         }
///     },
///     move || {
///         let down = down.clone();
///         async move {
///             down.fetch_sub(1, Ordering::SeqCst);
///             Ok(())
///         }
///     },
/// );
/// # let _ = command;
/// ```
pub struct FnCommand {
    label: String,
    execute: CommandFn,
    undo: CommandFn,
}

impl FnCommand {
    pub fn new<E, EF, U, UF>(label: impl Into<String>, execute: E, undo: U) -> Self
    where
        E: Fn() -> EF + Send + Sync + 'static,
        EF: Future<Output = Result<()>> + Send + 'static,
        U: Fn() -> UF + Send + Sync + 'static,
        UF: Future<Output = Result<()>> + Send + 'static,
    {
        Self {
            label: label.into(),
            execute: Box::new(move || execute().boxed()),
            undo: Box::new(move || undo().boxed()),
        }
    }
}

impl Command for FnCommand {
    fn label(&self) -> &str {
        &self.label
    }

    fn execute(&self) -> BoxFuture<'_, Result<()>> {
        (self.execute)()
    }

    fn undo(&self) -> BoxFuture<'_, Result<()>> {
        (self.undo)()
    }
}

/// Snapshot of the history for observers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryState {
    pub can_undo: bool,
    pub can_redo: bool,
    pub undo_depth: usize,
    pub redo_depth: usize,
    /// Label of the command `undo` would revert.
    pub undo_label: Option<String>,
    /// Label of the command `redo` would re-apply.
    pub redo_label: Option<String>,
}

#[derive(Default)]
struct Stacks {
    undo: VecDeque<Box<dyn Command>>,
    redo: Vec<Box<dyn Command>>,
}

/// Bounded undo/redo stacks.
pub struct History {
    stacks: Mutex<Stacks>,
    capacity: usize,
}

impl std::fmt::Debug for History {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("History")
            .field("undo_depth", &state.undo_depth)
            .field("redo_depth", &state.redo_depth)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl History {
    /// Create a history keeping at most `capacity` undoable commands.
    pub fn new(capacity: usize) -> Self {
        Self {
            stacks: Mutex::new(Stacks::default()),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Run `command` and record it. The redo stack is cleared; the oldest
    /// command is evicted when the undo stack is full. A failing command is
    /// not recorded.
    pub async fn execute(&self, command: Box<dyn Command>) -> Result<()> {
        command.execute().await?;
        tracing::debug!(target: targets::HISTORY, label = command.label(), "executed command");

        let mut stacks = self.stacks.lock();
        stacks.redo.clear();
        stacks.undo.push_back(command);
        while stacks.undo.len() > self.capacity {
            stacks.undo.pop_front();
        }
        Ok(())
    }

    /// Revert the most recent command. Returns `false` if there was nothing
    /// to undo. On failure the command stays on the undo stack.
    pub async fn undo(&self) -> Result<bool> {
        let popped = self.stacks.lock().undo.pop_back();
        let Some(command) = popped else {
            return Ok(false);
        };

        let result = command.undo().await;
        let mut stacks = self.stacks.lock();
        match result {
            Ok(()) => {
                tracing::debug!(target: targets::HISTORY, label = command.label(), "undid command");
                stacks.redo.push(command);
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(target: targets::HISTORY, label = command.label(), error = %err, "undo failed");
                stacks.undo.push_back(command);
                Err(err)
            }
        }
    }

    /// Re-apply the most recently undone command. Returns `false` if there
    /// was nothing to redo. On failure the command stays on the redo stack.
    pub async fn redo(&self) -> Result<bool> {
        let popped = self.stacks.lock().redo.pop();
        let Some(command) = popped else {
            return Ok(false);
        };

        let result = command.execute().await;
        let mut stacks = self.stacks.lock();
        match result {
            Ok(()) => {
                tracing::debug!(target: targets::HISTORY, label = command.label(), "redid command");
                stacks.undo.push_back(command);
                while stacks.undo.len() > self.capacity {
                    stacks.undo.pop_front();
                }
                Ok(true)
            }
            Err(err) => {
                tracing::warn!(target: targets::HISTORY, label = command.label(), error = %err, "redo failed");
                stacks.redo.push(command);
                Err(err)
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.stacks.lock().undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.stacks.lock().redo.is_empty()
    }

    /// Drop all recorded commands.
    pub fn clear(&self) {
        let mut stacks = self.stacks.lock();
        stacks.undo.clear();
        stacks.redo.clear();
    }

    /// Current depths and labels.
    pub fn state(&self) -> HistoryState {
        let stacks = self.stacks.lock();
        HistoryState {
            can_undo: !stacks.undo.is_empty(),
            can_redo: !stacks.redo.is_empty(),
            undo_depth: stacks.undo.len(),
            redo_depth: stacks.redo.len(),
            undo_label: stacks.undo.back().map(|c| c.label().to_string()),
            redo_label: stacks.redo.last().map(|c| c.label().to_string()),
        }
    }
}
