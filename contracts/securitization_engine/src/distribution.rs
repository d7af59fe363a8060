use crate::storage::{DistributionPlan, BASIS_POINTS};

/// Split a payment into servicing fee and equal per-pool shares
///
/// Formula:
/// - fee = amount × fee_bps / 10,000 (rounded down)
/// - distributable = amount - fee
/// - per_pool = distributable / pool_count (rounded down)
/// - dust = distributable - per_pool × pool_count
///
/// Example:
/// - amount: 268,500 (cents), fee: 25 bps, 2 pools
/// - fee: 671, distributable: 267,829, per_pool: 133,914, dust: 1
pub fn plan_distribution(amount: i128, fee_bps: u32, pool_count: u32) -> Option<DistributionPlan> {
    if amount <= 0 || pool_count == 0 || fee_bps as i128 > BASIS_POINTS {
        return None;
    }

    let fee = amount
        .checked_mul(fee_bps as i128)?
        .checked_div(BASIS_POINTS)?;
    let distributable = amount.checked_sub(fee)?;
    let per_pool = distributable.checked_div(pool_count as i128)?;
    let dust = distributable.checked_sub(per_pool.checked_mul(pool_count as i128)?)?;

    Some(DistributionPlan {
        amount,
        fee,
        distributable,
        pool_count,
        per_pool,
        dust,
    })
}

/// Every unit of the payment is accounted for exactly once
pub fn is_balanced(plan: &DistributionPlan) -> bool {
    let credited = plan
        .per_pool
        .checked_mul(plan.pool_count as i128)
        .and_then(|v| v.checked_add(plan.fee))
        .and_then(|v| v.checked_add(plan.dust));
    credited == Some(plan.amount)
        && plan.fee >= 0
        && plan.per_pool >= 0
        && plan.dust >= 0
        && plan.dust < plan.pool_count as i128
}
