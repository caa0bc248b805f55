//! Reconciliation state machine mapping a ledger read onto a backend
//! transition and a registry decision.
//!
//! Kept as a pure function so every row of the transition table is unit
//! testable without timers or transports.

use crate::domain::LedgerStatus;

/// Why a job reached the failed terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The ledger finalized the transaction with an error
    LedgerRejected(String),
    /// The retry budget was exhausted before finality was observed.
    /// Unresolved after the budget means failed, never left pending.
    RetryBudgetExhausted { attempts: u32 },
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LedgerRejected(detail) => write!(f, "ledger rejected: {detail}"),
            Self::RetryBudgetExhausted { attempts } => {
                write!(f, "unconfirmed after {attempts} attempts")
            }
        }
    }
}

/// Decision for one polling tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickDecision {
    /// Not terminal yet; poll again with the incremented attempt count
    KeepPolling { retry_count: u32 },
    /// Finality observed as success; confirm the backend record, retire job
    Confirm,
    /// Terminal failure; fail the backend record, retire job
    Fail(FailureReason),
}

impl TickDecision {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::KeepPolling { .. })
    }
}

/// Evaluate one ledger read against the transition table.
///
/// `retries_so_far` is the number of attempts already consumed before this
/// tick; reaching `budget` forces the timeout transition. Transport errors
/// are mapped to `Pending` by the caller before evaluation, so they consume
/// budget exactly like an unobserved signature.
pub fn evaluate(status: &LedgerStatus, retries_so_far: u32, budget: u32) -> TickDecision {
    match status {
        LedgerStatus::Confirmed => TickDecision::Confirm,
        LedgerStatus::Failed(detail) => {
            TickDecision::Fail(FailureReason::LedgerRejected(detail.clone()))
        }
        LedgerStatus::Pending => {
            let attempts = retries_so_far + 1;
            if attempts >= budget {
                TickDecision::Fail(FailureReason::RetryBudgetExhausted { attempts })
            } else {
                TickDecision::KeepPolling {
                    retry_count: attempts,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmed_is_terminal_regardless_of_attempts() {
        assert_eq!(evaluate(&LedgerStatus::Confirmed, 0, 12), TickDecision::Confirm);
        assert_eq!(evaluate(&LedgerStatus::Confirmed, 11, 12), TickDecision::Confirm);
    }

    #[test]
    fn test_failed_carries_ledger_detail() {
        let decision = evaluate(&LedgerStatus::Failed("InstructionError".to_string()), 3, 12);
        assert_eq!(
            decision,
            TickDecision::Fail(FailureReason::LedgerRejected("InstructionError".to_string()))
        );
    }

    #[test]
    fn test_pending_increments_attempts_below_budget() {
        assert_eq!(
            evaluate(&LedgerStatus::Pending, 0, 12),
            TickDecision::KeepPolling { retry_count: 1 }
        );
        assert_eq!(
            evaluate(&LedgerStatus::Pending, 10, 12),
            TickDecision::KeepPolling { retry_count: 11 }
        );
    }

    #[test]
    fn test_pending_at_budget_boundary_fails() {
        assert_eq!(
            evaluate(&LedgerStatus::Pending, 11, 12),
            TickDecision::Fail(FailureReason::RetryBudgetExhausted { attempts: 12 })
        );
        // Budget of 1 means a single unobserved read is already terminal
        assert_eq!(
            evaluate(&LedgerStatus::Pending, 0, 1),
            TickDecision::Fail(FailureReason::RetryBudgetExhausted { attempts: 1 })
        );
    }

    #[test]
    fn test_terminal_classification() {
        assert!(evaluate(&LedgerStatus::Confirmed, 0, 12).is_terminal());
        assert!(evaluate(&LedgerStatus::Pending, 11, 12).is_terminal());
        assert!(!evaluate(&LedgerStatus::Pending, 1, 12).is_terminal());
    }

    #[test]
    fn test_failure_reason_display() {
        let timeout = FailureReason::RetryBudgetExhausted { attempts: 12 };
        assert_eq!(timeout.to_string(), "unconfirmed after 12 attempts");
        let rejected = FailureReason::LedgerRejected("custom: 6".to_string());
        assert!(rejected.to_string().contains("custom: 6"));
    }
}
