use crate::storage::{TrancheAmounts, TrancheSplit, PERCENT};

/// Check that the split percentages cover exactly 100%
pub fn is_valid_split(split: &TrancheSplit) -> bool {
    split
        .senior_pct
        .checked_add(split.mezzanine_pct)
        .and_then(|v| v.checked_add(split.equity_pct))
        == Some(PERCENT as u32)
}

/// Divide a principal into tranche amounts
///
/// Formula:
/// - senior = principal × senior_pct / 100
/// - mezzanine = principal × mezzanine_pct / 100
/// - equity = principal - senior - mezzanine
///
/// Equity takes the rounding remainder, so the three parts always sum
/// to `principal` exactly.
///
/// Example (70/20/10):
/// - principal: 1,000,005
/// - senior: 700,003, mezzanine: 200,001, equity: 100,001
pub fn split_principal(principal: i128, split: &TrancheSplit) -> Option<TrancheAmounts> {
    if principal < 0 || !is_valid_split(split) {
        return None;
    }

    let senior = principal
        .checked_mul(split.senior_pct as i128)?
        .checked_div(PERCENT)?;
    let mezzanine = principal
        .checked_mul(split.mezzanine_pct as i128)?
        .checked_div(PERCENT)?;
    let equity = principal.checked_sub(senior)?.checked_sub(mezzanine)?;

    Some(TrancheAmounts {
        senior,
        mezzanine,
        equity,
    })
}
