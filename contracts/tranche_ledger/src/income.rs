/// Fixed-point scale of the income index (12 decimals)
pub const INDEX_SCALE: i128 = 1_000_000_000_000;

/// Index increase for a donation spread over `total_units`
///
/// Formula: increment = amount × INDEX_SCALE / total_units
///
/// The rounding remainder stays in the ledger contract.
pub fn index_increment(amount: i128, total_units: i128) -> Option<i128> {
    if total_units <= 0 {
        return None;
    }
    amount.checked_mul(INDEX_SCALE)?.checked_div(total_units)
}

/// Value actually credited to holders by an index increment
///
/// Formula: credited = increment × total_units / INDEX_SCALE
///
/// Never more than the amount the increment was computed from.
pub fn credited_by(increment: i128, total_units: i128) -> Option<i128> {
    increment.checked_mul(total_units)?.checked_div(INDEX_SCALE)
}

/// Income earned by `units` between two index values
///
/// Formula: accrued = units × (pool_index - holder_index) / INDEX_SCALE
pub fn accrued_between(units: i128, pool_index: i128, holder_index: i128) -> Option<i128> {
    let delta = pool_index.checked_sub(holder_index)?;
    units.checked_mul(delta)?.checked_div(INDEX_SCALE)
}

/// Loss-adjusted value of a unit position
///
/// Formula: value = units × outstanding_value / units_issued
pub fn claim_value(units: i128, outstanding_value: i128, units_issued: i128) -> Option<i128> {
    if units_issued == 0 {
        return Some(0);
    }
    units.checked_mul(outstanding_value)?.checked_div(units_issued)
}
