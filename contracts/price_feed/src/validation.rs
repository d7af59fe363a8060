use crate::storage::BASIS_POINTS;

/// Relative move between two prices, in basis points of the previous one
///
/// Formula: deviation = |next - previous| × 10,000 / previous
///
/// Example:
/// - previous: 0.99, next: 1.10
/// - deviation: 0.11 × 10,000 / 0.99 = 1,111 bps
pub fn deviation_bps(previous: i128, next: i128) -> Option<i128> {
    if previous <= 0 {
        return None;
    }
    next.checked_sub(previous)?
        .checked_abs()?
        .checked_mul(BASIS_POINTS)?
        .checked_div(previous)
}

/// Check the move against the bound without rounding
///
/// Formula: |next - previous| × 10,000 > previous × max_deviation_bps
///
/// A move too large to compute counts as exceeding the bound.
pub fn exceeds_deviation(previous: i128, next: i128, max_deviation_bps: u32) -> bool {
    let moved = next
        .checked_sub(previous)
        .and_then(|d| d.checked_abs())
        .and_then(|d| d.checked_mul(BASIS_POINTS));
    let allowed = previous.checked_mul(max_deviation_bps as i128);

    match (moved, allowed) {
        (Some(moved), Some(allowed)) => moved > allowed,
        _ => true,
    }
}

/// A quote is stale once its age strictly exceeds `max_age`
pub fn is_stale(timestamp: u64, now: u64, max_age: u64) -> bool {
    now.saturating_sub(timestamp) > max_age
}
