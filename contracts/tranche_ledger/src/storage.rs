use soroban_sdk::{contracttype, Address};

/// Tranche classes in subordination order, senior first.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum TrancheClass {
    /// Last to absorb losses (e.g. "AAA")
    Senior = 0,
    /// Absorbs losses once equity is exhausted (e.g. "BBB")
    Mezzanine = 1,
    /// First-loss piece (not rated)
    Equity = 2,
}

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Tranche {
    /// Loss-adjusted book value backing the tranche
    pub outstanding_value: i128,
    /// Units minted for this class; never reduced by losses
    pub units_issued: i128,
}

/// Solvency record of one securitization pool.
///
/// `senior + mezzanine + equity` outstanding always equals
/// `total_collateral_value`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TranchePool {
    pub pool_id: u32,
    pub total_collateral_value: i128,
    pub senior: Tranche,
    pub mezzanine: Tranche,
    pub equity: Tranche,
}

impl TranchePool {
    pub fn new(pool_id: u32) -> Self {
        Self {
            pool_id,
            total_collateral_value: 0,
            senior: Tranche::default(),
            mezzanine: Tranche::default(),
            equity: Tranche::default(),
        }
    }

    pub fn tranche(&self, class: TrancheClass) -> &Tranche {
        match class {
            TrancheClass::Senior => &self.senior,
            TrancheClass::Mezzanine => &self.mezzanine,
            TrancheClass::Equity => &self.equity,
        }
    }

    pub fn tranche_mut(&mut self, class: TrancheClass) -> &mut Tranche {
        match class {
            TrancheClass::Senior => &mut self.senior,
            TrancheClass::Mezzanine => &mut self.mezzanine,
            TrancheClass::Equity => &mut self.equity,
        }
    }

    pub fn total_units(&self) -> Option<i128> {
        self.senior
            .units_issued
            .checked_add(self.mezzanine.units_issued)?
            .checked_add(self.equity.units_issued)
    }

    pub fn is_conserved(&self) -> bool {
        self.senior
            .outstanding_value
            .checked_add(self.mezzanine.outstanding_value)
            .and_then(|v| v.checked_add(self.equity.outstanding_value))
            == Some(self.total_collateral_value)
    }
}

/// Pool-wide income accumulator.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PoolIncome {
    /// Cumulative income per unit, scaled by `INDEX_SCALE`
    pub index: i128,
    pub total_donated: i128,
    /// Donated value not yet reflected in the index, carried into the next donation
    pub undistributed: i128,
}

/// Per-holder income checkpoint.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct HolderIncome {
    /// Pool index at the holder's last settlement
    pub index: i128,
    /// Settled but unclaimed income
    pub accrued: i128,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Initialized,
    Stablecoin,
    Operators(Address),
    Pool(u32),
    Balance(u32, TrancheClass, Address), // (pool_id, class, holder)
    PoolIncome(u32),
    HolderIncome(u32, Address), // (pool_id, holder)
}
