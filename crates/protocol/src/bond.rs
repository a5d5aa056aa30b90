//! Validator stake state and the intents that change it.

use alloy_primitives::U256;
use thiserror::Error;

/// 100% in basis points.
pub const MAX_BPS: u16 = 10_000;

/// A validator's stake as last read from the bond ledger.
///
/// This is a read-through cache: the ledger is authoritative.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BondState {
    /// Self-bonded balance.
    pub balance: U256,
    /// Balance delegated to the validator.
    pub delegated: U256,
    /// Commission taken from delegator rewards.
    pub commission_rate_bps: u16,
    /// Largest change of the commission rate allowed at once.
    pub commission_max_change_bps: u16,
    /// Whether the validator is jailed and may not submit outputs.
    pub jailed: bool,
}

/// A bond intent with invalid parameters.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondIntentError {
    /// An amount-bearing intent carries zero.
    #[error("amount must be greater than zero")]
    ZeroAmount,
    /// The commission rate exceeds 100%.
    #[error("commission rate {0} bps exceeds {MAX_BPS} bps")]
    CommissionRateOutOfRange(u16),
    /// The commission max change rate exceeds 100%.
    #[error("commission max change rate {0} bps exceeds {MAX_BPS} bps")]
    CommissionMaxChangeOutOfRange(u16),
    /// A percentage exceeds 100.
    #[error("percentage {0} exceeds 100")]
    PercentOutOfRange(u64),
}

/// Converts an integer percentage to basis points.
pub fn percent_to_bps(percent: u64) -> Result<u16, BondIntentError> {
    if percent > 100 {
        return Err(BondIntentError::PercentOutOfRange(percent));
    }
    Ok(percent as u16 * 100)
}

/// A state-changing request against the bond ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondIntent {
    /// Deposits stake into the validator pool.
    Deposit {
        /// Amount in the smallest unit.
        amount: U256,
    },
    /// Withdraws unbonded stake from the validator pool.
    Withdraw {
        /// Amount in the smallest unit.
        amount: U256,
    },
    /// Unbonds the oldest finalized bond.
    Unbond,
    /// Approves the asset manager to move governance tokens.
    Approve {
        /// Amount in the smallest unit.
        amount: U256,
    },
    /// Delegates governance tokens to the validator.
    Delegate {
        /// Amount in the smallest unit.
        amount: U256,
    },
    /// Starts undelegating governance tokens.
    InitUndelegate {
        /// Amount in the smallest unit.
        amount: U256,
    },
    /// Completes a pending undelegation.
    FinalizeUndelegate,
    /// Starts claiming validator rewards.
    InitClaimReward {
        /// Amount in the smallest unit.
        amount: U256,
    },
    /// Completes a pending reward claim.
    FinalizeClaimReward,
    /// Registers as a validator with an initial self-bond.
    Register {
        /// Amount in the smallest unit.
        amount: U256,
        /// Commission rate in basis points.
        commission_rate_bps: u16,
        /// Largest allowed commission change in basis points.
        commission_max_change_bps: u16,
    },
    /// Asks to be released from jail.
    TryUnjail,
    /// Changes the commission rate.
    ChangeCommissionRate {
        /// The new commission rate in basis points.
        new_rate_bps: u16,
    },
}

impl BondIntent {
    /// Returns the command name of the intent.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Deposit { .. } => "deposit",
            Self::Withdraw { .. } => "withdraw",
            Self::Unbond => "unbond",
            Self::Approve { .. } => "approve",
            Self::Delegate { .. } => "delegate",
            Self::InitUndelegate { .. } => "initUndelegate",
            Self::FinalizeUndelegate => "finalizeUndelegate",
            Self::InitClaimReward { .. } => "initClaimValidatorReward",
            Self::FinalizeClaimReward => "finalizeClaimValidatorReward",
            Self::Register { .. } => "registerValidator",
            Self::TryUnjail => "tryUnjail",
            Self::ChangeCommissionRate { .. } => "changeCommissionRate",
        }
    }

    /// Returns the amount carried by the intent, if any.
    pub const fn amount(&self) -> Option<U256> {
        match self {
            Self::Deposit { amount }
            | Self::Withdraw { amount }
            | Self::Approve { amount }
            | Self::Delegate { amount }
            | Self::InitUndelegate { amount }
            | Self::InitClaimReward { amount }
            | Self::Register { amount, .. } => Some(*amount),
            _ => None,
        }
    }

    /// Checks the intent parameters.
    pub fn validate(&self) -> Result<(), BondIntentError> {
        if self.amount().is_some_and(|a| a.is_zero()) {
            return Err(BondIntentError::ZeroAmount);
        }
        match *self {
            Self::Register { commission_rate_bps, commission_max_change_bps, .. } => {
                if commission_rate_bps > MAX_BPS {
                    return Err(BondIntentError::CommissionRateOutOfRange(commission_rate_bps));
                }
                if commission_max_change_bps > MAX_BPS {
                    return Err(BondIntentError::CommissionMaxChangeOutOfRange(
                        commission_max_change_bps,
                    ));
                }
            }
            Self::ChangeCommissionRate { new_rate_bps } if new_rate_bps > MAX_BPS => {
                return Err(BondIntentError::CommissionRateOutOfRange(new_rate_bps));
            }
            _ => {}
        }
        Ok(())
    }
}

impl core::fmt::Display for BondIntent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())?;
        if let Some(amount) = self.amount() {
            write!(f, " amount={amount}")?;
        }
        match self {
            Self::Register { commission_rate_bps, commission_max_change_bps, .. } => write!(
                f,
                " commission_rate_bps={commission_rate_bps} commission_max_change_bps={commission_max_change_bps}"
            ),
            Self::ChangeCommissionRate { new_rate_bps } => write!(f, " new_rate_bps={new_rate_bps}"),
            _ => Ok(()),
        }
    }
}
