//! Optimistic update with rollback.
//!
//! Every persisted mutation runs the same sequence: apply the change to
//! local state, notify observers, await the adapter, and on failure revert
//! exactly what was applied, notify again and publish an `error` event.

use futures_util::future::BoxFuture;
use horizon_grid_core::logging::targets;

use crate::adapter::{AdapterResult, PersistenceAdapter};
use crate::engine::{EngineInner, GridState};
use crate::error::{GridError, Operation, Result};

/// Which side of the mutation an observer notification is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Applied,
    Reverted,
}

/// Apply a mutation optimistically and persist it.
///
/// `apply` mutates the state and returns a snapshot of what it replaced;
/// `revert` restores that snapshot. `notify` runs outside the state lock
/// after each of them. Without an adapter the change stays local and
/// `Ok(None)` is returned.
pub(crate) async fn optimistic<'a, S, T>(
    inner: &'a EngineInner,
    operation: Operation,
    apply: impl FnOnce(&mut GridState) -> Result<S>,
    notify: impl Fn(&EngineInner, &S, Phase),
    commit: impl FnOnce(&'a dyn PersistenceAdapter, &S) -> BoxFuture<'a, AdapterResult<T>>,
    revert: impl FnOnce(&mut GridState, &S),
) -> Result<Option<T>> {
    let snapshot = inner.with_state(apply)?;
    notify(inner, &snapshot, Phase::Applied);
    inner.request_repaint();

    let Some(adapter) = inner.adapter() else {
        tracing::trace!(target: targets::ENGINE, %operation, "no adapter, change kept local");
        return Ok(None);
    };

    match commit(adapter, &snapshot).await {
        Ok(value) => {
            tracing::debug!(target: targets::ENGINE, %operation, "persisted");
            Ok(Some(value))
        }
        Err(source) => {
            inner.with_state(|state| revert(state, &snapshot));
            notify(inner, &snapshot, Phase::Reverted);
            inner.request_repaint();
            let err = GridError::persistence(operation, source);
            inner.report(operation, &err);
            Err(err)
        }
    }
}
