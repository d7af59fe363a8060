use soroban_sdk::{contracttype, Address};

pub const BASIS_POINTS: u32 = 10_000;
pub const MAX_TERM_MONTHS: u32 = 480;

/// Underwriting attributes captured at origination.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RiskAttributes {
    /// Borrower credit score (e.g. FICO 300-850)
    pub credit_score: u32,
    /// Loan-to-value ratio in basis points
    pub ltv_bps: u32,
    /// Debt-to-income ratio in basis points
    pub dti_bps: u32,
}

/// Immutable loan terms of a mortgage instrument.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MortgageDetails {
    /// Original principal in payment-currency units
    pub principal: i128,
    /// Annual interest rate in basis points
    pub rate_bps: u32,
    /// Loan term in months
    pub term_months: u32,
    pub risk: RiskAttributes,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Instrument {
    pub id: u64,
    pub owner: Address,
    pub details: MortgageDetails,
    pub created_at: u64,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Admin,
    Initialized,
    Originator(Address),
    Instrument(u64),
    InstrumentCounter,
}
