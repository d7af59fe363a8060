use soroban_sdk::{contracttype, Address, Vec};

// Constants
pub const BASIS_POINTS: i128 = 10_000; // 100% = 10,000 basis points
pub const PERCENT: i128 = 100;
pub const MONTHS_PER_YEAR: i128 = 12;
/// One payment period (30 days)
pub const PAYMENT_PERIOD_SECS: u64 = 30 * 24 * 3600;

pub const DEFAULT_FEE_BPS: u32 = 25; // 0.25% servicing fee
pub const DEFAULT_MIN_PAYMENT: i128 = 100;

/// Tranche classes in subordination order, senior first.
///
/// Wire-compatible with the tranche ledger's class enum.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub enum TrancheClass {
    Senior = 0,
    Mezzanine = 1,
    Equity = 2,
}

/// Attestation capabilities an account can be granted.
///
/// The holder may be a plain account or a contract account (multisig,
/// staking committee), which makes the reporting trust model pluggable.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Capability {
    /// May write down tranche value and deactivate liquidated schedules
    ReportsLoss = 0,
}

/// Subordination percentages; must sum to 100.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrancheSplit {
    pub senior_pct: u32,
    pub mezzanine_pct: u32,
    pub equity_pct: u32,
}

impl Default for TrancheSplit {
    fn default() -> Self {
        Self {
            senior_pct: 70,
            mezzanine_pct: 20,
            equity_pct: 10,
        }
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TrancheAmounts {
    pub senior: i128,
    pub mezzanine: i128,
    pub equity: i128,
}

impl TrancheAmounts {
    pub fn get(&self, class: TrancheClass) -> i128 {
        match class {
            TrancheClass::Senior => self.senior,
            TrancheClass::Mezzanine => self.mezzanine,
            TrancheClass::Equity => self.equity,
        }
    }

    pub fn total(&self) -> Option<i128> {
        self.senior
            .checked_add(self.mezzanine)?
            .checked_add(self.equity)
    }
}

// Mirrors of the collateral registry's records. Field names must match
// for cross-contract decoding.

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RiskAttributes {
    pub credit_score: u32,
    pub ltv_bps: u32,
    pub dti_bps: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MortgageDetails {
    pub principal: i128,
    pub rate_bps: u32,
    pub term_months: u32,
    pub risk: RiskAttributes,
}

// Mirrors of the tranche ledger's pool record.

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Tranche {
    pub outstanding_value: i128,
    pub units_issued: i128,
}

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
    pub fn outstanding(&self, class: TrancheClass) -> i128 {
        match class {
            TrancheClass::Senior => self.senior.outstanding_value,
            TrancheClass::Mezzanine => self.mezzanine.outstanding_value,
            TrancheClass::Equity => self.equity.outstanding_value,
        }
    }
}

/// Servicing state of one securitized instrument
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PaymentSchedule {
    pub instrument_id: u64,
    /// Pool the instrument was securitized into
    pub pool_id: u32,
    /// Expected payment per period
    pub periodic_amount_due: i128,
    /// Loan-level amortization counter (not tranche outstanding value)
    pub principal_remaining: i128,
    /// Annual rate in basis points
    pub rate_bps: u32,
    pub last_payment_timestamp: u64,
    pub missed_periods: u32,
    /// False after payoff or liquidation
    pub active: bool,
}

/// Result of running a loss through the tranche waterfall
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LossAllocation {
    pub pool_id: u32,
    /// Loss as reported
    pub requested: i128,
    pub equity: i128,
    pub mezzanine: i128,
    pub senior: i128,
    /// Sum written down across tranches
    pub absorbed: i128,
    /// Reported loss beyond the pool's total outstanding value
    pub shortfall: i128,
}

/// How one payment is split between the fee sink and destination pools
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DistributionPlan {
    pub amount: i128,
    pub fee: i128,
    pub distributable: i128,
    pub pool_count: u32,
    /// Share credited to each destination pool
    pub per_pool: i128,
    /// Integer-division remainder, routed to the fee sink
    pub dust: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PaymentInstruction {
    pub instrument_id: u64,
    pub payer: Address,
    pub amount: i128,
    pub destination_pools: Vec<u32>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineConfig {
    pub admin: Address,
    /// Collateral registry contract
    pub registry: Address,
    /// Tranche ledger contract (this engine must be one of its operators)
    pub ledger: Address,
    /// Payment currency (SEP-41 token)
    pub stablecoin: Address,
    /// Receives servicing fees and distribution dust
    pub fee_sink: Address,
    pub split: TrancheSplit,
    pub fee_bps: u32,
    pub min_payment: i128,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Config,
    Initialized,
    Paused,
    Role(Capability, Address),
    Securitized(u64), // instrument_id → pool_id
    Schedule(u64),    // instrument_id → PaymentSchedule
}
