//! Single-assignment cell memoizing the outcome of a version resolver.
//!
//! The cell starts `Unresolved` and moves to `Resolved` or `Failed` on the
//! first resolution. Both are terminal: once settled, the resolver is never
//! called again and every reader gets a clone of the same outcome.
//!
//! Resolution is serialized behind a mutex, so among concurrent first callers
//! exactly one runs the resolver while the rest wait and then observe its
//! outcome. Settled reads go through a [`OnceLock`] and never take the mutex.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;
use tracing::{error, info};

use crate::error::ResolveError;
use crate::resolver::VersionResolver;

/// What to do when the resolver fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure; it is served to every later request and the
    /// resolver is never called again.
    #[default]
    Memoize,
    /// Report the failure but leave the cell unresolved so the next request
    /// resolves again. A success is still terminal.
    Retry,
}

/// Observable state of a [`MemoizedVersion`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    Unresolved,
    Resolved(String),
    Failed(ResolveError),
}

type Outcome = Result<String, ResolveError>;

#[derive(Debug, Default)]
pub struct MemoizedVersion {
    settled: OnceLock<Outcome>,
    transition: Mutex<()>,
    policy: FailurePolicy,
}

impl MemoizedVersion {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            settled: OnceLock::new(),
            transition: Mutex::new(()),
            policy,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Settled outcome, if any. Never blocks and never resolves.
    pub fn get(&self) -> Option<Outcome> {
        self.settled.get().cloned()
    }

    pub fn state(&self) -> ResolutionState {
        match self.settled.get() {
            None => ResolutionState::Unresolved,
            Some(Ok(version)) => ResolutionState::Resolved(version.clone()),
            Some(Err(err)) => ResolutionState::Failed(err.clone()),
        }
    }

    /// Return the settled outcome, running `resolver` first if the cell is
    /// still unresolved.
    ///
    /// Blocks while another caller is resolving and for the duration of the
    /// resolver itself.
    pub fn get_or_resolve(&self, resolver: &dyn VersionResolver) -> Outcome {
        if let Some(outcome) = self.settled.get() {
            return outcome.clone();
        }

        let _guard = self.transition.lock();

        // Settled while we were waiting for the previous resolution.
        if let Some(outcome) = self.settled.get() {
            return outcome.clone();
        }

        let outcome = invoke(resolver);
        match &outcome {
            Ok(version) => {
                info!("Resolved application version: {}", version);
                self.settle(outcome.clone());
            }
            Err(err) => match self.policy {
                FailurePolicy::Memoize => {
                    error!(
                        "Failed to resolve application version, failure is permanent: {}",
                        err
                    );
                    self.settle(outcome.clone());
                }
                FailurePolicy::Retry => {
                    error!(
                        "Failed to resolve application version, will retry on next request: {}",
                        err
                    );
                }
            },
        }
        outcome
    }

    fn settle(&self, outcome: Outcome) {
        // Only reachable under the transition lock with the cell empty.
        let _ = self.settled.set(outcome);
    }
}

/// Run the resolver, turning both errors and panics into a [`ResolveError`].
fn invoke(resolver: &dyn VersionResolver) -> Outcome {
    match panic::catch_unwind(AssertUnwindSafe(|| resolver.resolve())) {
        Ok(Ok(version)) => Ok(version),
        Ok(Err(err)) => Err(ResolveError::from_anyhow(err)),
        Err(payload) => Err(ResolveError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
