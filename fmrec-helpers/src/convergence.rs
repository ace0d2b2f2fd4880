//! Per-epoch convergence tracking shared by the factorization-machine trainers.
//!
//! A trainer calls its [`ConvergenceHook`] once after every completed epoch with
//! the epoch index and the epoch's loss. The hook answers with a [`HookAction`];
//! whether a `Stop` is honoured is up to the trainer's configuration.

use crate::Float;
use tracing::{debug, warn};

/// Action to take after a hook runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAction {
    /// Keep training.
    Continue,
    /// The loss has converged; stop before the next epoch.
    Stop,
}

impl HookAction {
    pub fn is_stop(self) -> bool {
        self == HookAction::Stop
    }
}

/// Trait for epoch-level convergence hooks.
pub trait ConvergenceHook<F: Float> {
    /// Called once per completed epoch.
    ///
    /// # Arguments
    ///
    /// * `epoch` - The 0-indexed epoch that just finished.
    /// * `loss` - The accumulated (halved) loss of that epoch.
    fn after_epoch(&mut self, epoch: usize, loss: F) -> HookAction;
}

impl<F, H> ConvergenceHook<F> for &mut H
where
    F: Float,
    H: ConvergenceHook<F> + ?Sized,
{
    fn after_epoch(&mut self, epoch: usize, loss: F) -> HookAction {
        (**self).after_epoch(epoch, loss)
    }
}

/// Stops once the loss changes by less than `tolerance` between two epochs.
///
/// The previous loss starts at zero, so a first epoch whose loss is already
/// within `tolerance` of zero counts as converged.
#[derive(Debug, Clone)]
pub struct LossDeltaConvergence<F: Float> {
    tolerance: F,
    previous: F,
}

impl<F: Float> LossDeltaConvergence<F> {
    pub fn new(tolerance: F) -> Self {
        Self {
            tolerance,
            previous: F::zero(),
        }
    }

    pub fn tolerance(&self) -> F {
        self.tolerance
    }

    /// Loss recorded at the last completed epoch.
    pub fn previous_loss(&self) -> F {
        self.previous
    }
}

impl<F: Float> Default for LossDeltaConvergence<F> {
    fn default() -> Self {
        Self::new(F::lossy_from(1e-5))
    }
}

impl<F: Float> ConvergenceHook<F> for LossDeltaConvergence<F> {
    fn after_epoch(&mut self, epoch: usize, loss: F) -> HookAction {
        let delta = self.previous - loss;
        debug!(epoch, loss = ?loss, delta = ?delta, "epoch finished");
        if !loss.is_finite() {
            warn!(epoch, loss = ?loss, "loss is NaN or infinite; check learn rate and regularization");
        }
        self.previous = loss;
        if num_traits::Float::abs(delta) < self.tolerance {
            HookAction::Stop
        } else {
            HookAction::Continue
        }
    }
}
