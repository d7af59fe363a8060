use crate::storage::{BASIS_POINTS, MONTHS_PER_YEAR, PAYMENT_PERIOD_SECS};

/// Interest accrued on the remaining principal over one period
///
/// Formula: interest = principal_remaining × rate_bps / (10,000 × 12)
pub fn period_interest(principal_remaining: i128, rate_bps: u32) -> Option<i128> {
    principal_remaining
        .checked_mul(rate_bps as i128)?
        .checked_div(BASIS_POINTS.checked_mul(MONTHS_PER_YEAR)?)
}

/// Expected payment per period: straight-line principal plus first-period interest
///
/// Formula: due = ceil(principal / term_months) + period_interest(principal)
///
/// Example:
/// - principal: 360,000, rate: 6% (600 bps), term: 360 months
/// - due: 1,000 + 1,800 = 2,800
pub fn periodic_amount_due(principal: i128, rate_bps: u32, term_months: u32) -> Option<i128> {
    if term_months == 0 {
        return None;
    }
    let term = term_months as i128;
    let principal_part = principal.checked_add(term - 1)?.checked_div(term)?;
    principal_part.checked_add(period_interest(principal, rate_bps)?)
}

/// Portion of a payment that amortizes principal
///
/// The payment first covers one period of interest; the rest reduces
/// principal, capped at what remains.
pub fn principal_reduction(
    payment: i128,
    principal_remaining: i128,
    rate_bps: u32,
) -> Option<i128> {
    let interest = period_interest(principal_remaining, rate_bps)?;
    let excess = payment.checked_sub(interest)?.max(0);
    Some(excess.min(principal_remaining))
}

/// Whole periods elapsed since the last payment
pub fn missed_periods(last_payment_timestamp: u64, now: u64) -> u32 {
    let elapsed = now.saturating_sub(last_payment_timestamp) / PAYMENT_PERIOD_SECS;
    u32::try_from(elapsed).unwrap_or(u32::MAX)
}
