pub mod duplicates;
pub mod payoff;
pub mod projection;
pub mod recurrence;

pub use duplicates::{normalize_counterparty, DuplicateCandidate, DuplicateDetector};
pub use payoff::{calculate_months_to_payoff, calculate_payoff_date, calculate_recommendation};
pub use projection::{BudgetProjector, PROJECTION_HORIZON_MONTHS};
pub use recurrence::{counterparty_key, DetectedPattern, RecurrenceDetector};

use cashwise_core::Money;

// The analysis is single-currency in practice. A mismatched amount leaves
// the running value untouched instead of failing the whole computation.

pub(crate) fn add_or_unchanged(total: Money, amount: Money) -> Money {
    total.checked_add(amount).unwrap_or_else(|err| {
        tracing::warn!(%err, "ignoring amount in another currency");
        total
    })
}

pub(crate) fn sub_or_unchanged(total: Money, amount: Money) -> Money {
    total.checked_sub(amount).unwrap_or_else(|err| {
        tracing::warn!(%err, "ignoring amount in another currency");
        total
    })
}
