//! Epoch and proposer window arithmetic.

use crate::Epoch;
use kroma_genesis::RollupConfig;

/// Where a submission falls relative to the windows of its origin epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionTiming {
    /// Submitted before the proposer window of the origin epoch closed.
    OnTime,
    /// Submitted after the proposer window closed but before the channel deadline.
    Late,
    /// Submitted after the channel deadline.
    Abandoned,
}

/// Pure arithmetic over the timing parameters of a validated [RollupConfig].
///
/// Proposer windows tile the epoch axis starting at the L1 genesis epoch. Every method is
/// total and depends only on its inputs and the config it was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCalculator {
    genesis_epoch: Epoch,
    window_size: u64,
    max_proposer_drift: u64,
    channel_timeout: u64,
}

impl WindowCalculator {
    /// Creates a new [WindowCalculator] from a config that has passed [RollupConfig::check].
    pub const fn new(cfg: &RollupConfig) -> Self {
        // A checked config never has a window below 2; clamp so the arithmetic stays total.
        let window_size = if cfg.proposer_window_size == 0 { 1 } else { cfg.proposer_window_size };
        Self {
            genesis_epoch: Epoch(cfg.genesis.l1.number),
            window_size,
            max_proposer_drift: cfg.max_proposer_drift,
            channel_timeout: cfg.channel_timeout,
        }
    }

    /// Returns the epoch an L1 block belongs to.
    pub const fn epoch_for_l1_block(&self, number: u64) -> Epoch {
        Epoch(number)
    }

    /// Returns the first epoch of the proposer window containing `epoch`.
    ///
    /// Epochs before genesis belong to the first window.
    pub const fn proposer_window_start(&self, epoch: Epoch) -> Epoch {
        let g = self.genesis_epoch.0;
        if epoch.0 < g {
            return self.genesis_epoch;
        }
        let index = (epoch.0 - g) / self.window_size;
        Epoch(g + index * self.window_size)
    }

    /// Returns the last epoch of the proposer window containing `epoch`.
    pub const fn proposer_window_end(&self, epoch: Epoch) -> Epoch {
        self.proposer_window_start(epoch).saturating_add(self.window_size - 1)
    }

    /// Returns `true` if an L2 timestamp is within the allowed drift of its L1 origin.
    pub const fn is_within_drift(&self, l2_time: u64, l1_origin_time: u64) -> bool {
        l2_time <= l1_origin_time.saturating_add(self.max_proposer_drift)
    }

    /// Returns the epoch by which a channel opened at `opened_at` must be closed.
    pub const fn channel_deadline(&self, opened_at: Epoch) -> Epoch {
        opened_at.saturating_add(self.channel_timeout)
    }

    /// Classifies a submission made at `submitted` for outputs originating at `origin`.
    pub const fn classify_submission(&self, origin: Epoch, submitted: Epoch) -> SubmissionTiming {
        if submitted.0 > self.channel_deadline(origin).0 {
            SubmissionTiming::Abandoned
        } else if submitted.0 > self.proposer_window_end(origin).0 {
            SubmissionTiming::Late
        } else {
            SubmissionTiming::OnTime
        }
    }
}
