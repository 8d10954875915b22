//! Learning-rate scheduling
//!
//! Reduce-on-plateau: when the validation loss stops improving for
//! `patience` consecutive epochs, multiply the learning rate by `factor`,
//! never dropping below `min_lr`.

use tracing::info;

/// Reduce-on-plateau learning-rate scheduler
#[derive(Debug, Clone)]
pub struct ReduceLrOnPlateau {
    factor: f64,
    patience: usize,
    min_lr: f64,
    current_lr: f64,
    best_loss: f64,
    bad_epochs: usize,
}

impl ReduceLrOnPlateau {
    /// Create a scheduler starting at `initial_lr`
    pub fn new(initial_lr: f64, factor: f64, patience: usize, min_lr: f64) -> Self {
        Self {
            factor,
            patience,
            min_lr,
            current_lr: initial_lr,
            best_loss: f64::INFINITY,
            bad_epochs: 0,
        }
    }

    /// Record an epoch's validation loss and return the rate to use next
    ///
    /// An epoch counts as "bad" when its loss does not improve on the best
    /// seen so far. Once `patience` bad epochs accumulate in a row the
    /// rate is reduced and the counter resets.
    pub fn step(&mut self, val_loss: f64) -> f64 {
        if val_loss < self.best_loss {
            self.best_loss = val_loss;
            self.bad_epochs = 0;
        } else {
            self.bad_epochs += 1;
            if self.bad_epochs >= self.patience {
                let reduced = (self.current_lr * self.factor).max(self.min_lr);
                if reduced < self.current_lr {
                    info!(
                        "Validation loss plateaued; reducing learning rate {:.2e} -> {:.2e}",
                        self.current_lr, reduced
                    );
                    self.current_lr = reduced;
                }
                self.bad_epochs = 0;
            }
        }
        self.current_lr
    }

    /// The learning rate currently in effect
    pub fn learning_rate(&self) -> f64 {
        self.current_lr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_improving_loss_keeps_rate() {
        let mut sched = ReduceLrOnPlateau::new(1e-3, 0.5, 3, 1e-5);
        for loss in [1.0, 0.9, 0.8, 0.7, 0.6] {
            assert_eq!(sched.step(loss), 1e-3);
        }
    }

    #[test]
    fn test_plateau_halves_rate_after_patience() {
        let mut sched = ReduceLrOnPlateau::new(1e-3, 0.5, 3, 1e-5);
        sched.step(1.0);

        // Third consecutive bad epoch triggers the reduction
        assert_eq!(sched.step(1.0), 1e-3);
        assert_eq!(sched.step(1.1), 1e-3);
        assert_eq!(sched.step(1.0), 5e-4);
    }

    #[test]
    fn test_rate_never_drops_below_floor() {
        let mut sched = ReduceLrOnPlateau::new(4e-5, 0.5, 0, 1e-5);
        sched.step(1.0);

        assert_eq!(sched.step(1.0), 2e-5);
        assert_eq!(sched.step(1.0), 1e-5);
        // Clamped at the floor from here on
        assert_eq!(sched.step(1.0), 1e-5);
        assert_eq!(sched.step(1.0), 1e-5);
    }

    #[test]
    fn test_improvement_resets_bad_epoch_count() {
        let mut sched = ReduceLrOnPlateau::new(1e-3, 0.5, 2, 1e-5);
        sched.step(1.0);

        sched.step(1.1);
        // Improvement wipes the streak
        sched.step(0.9);
        assert_eq!(sched.step(1.0), 1e-3);
        assert_eq!(sched.step(1.0), 5e-4);
    }
}
