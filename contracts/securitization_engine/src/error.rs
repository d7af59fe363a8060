use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // ============================================
    // INITIALIZATION ERRORS (1-5)
    // ============================================
    /// Contract already initialized
    AlreadyInitialized = 1,
    /// Contract not initialized
    NotInitialized = 2,

    // ============================================
    // AUTHORIZATION ERRORS (10-19)
    // ============================================
    /// Caller lacks the admin key or the required capability
    Unauthorized = 10,
    /// Investor does not hold the instrument
    NotOwner = 11,

    // ============================================
    // LOOKUP ERRORS (20-29)
    // ============================================
    /// Unknown instrument id
    InstrumentNotFound = 20,
    /// Pool has never been securitized into
    PoolNotFound = 21,
    /// Instrument has no payment schedule (not securitized)
    ScheduleNotFound = 22,

    // ============================================
    // STATE ERRORS (30-39)
    // ============================================
    /// Instrument already converted into tranche units
    AlreadySecuritized = 30,
    /// Operation was already applied (e.g. schedule already deactivated)
    AlreadyProcessed = 31,
    /// Payment schedule deactivated by payoff or liquidation
    InactiveSchedule = 32,

    // ============================================
    // INPUT ERRORS (40-49)
    // ============================================
    /// Amount must be positive
    InvalidAmount = 40,
    /// Split percentages must sum to 100
    InvalidSplit = 41,
    /// Fee must be at most 10,000 basis points
    InvalidFee = 42,
    /// Payment below the configured minimum
    PaymentTooSmall = 43,
    /// Payment has no destination pools
    NoDestinationPools = 44,
    /// Batch contains no items
    EmptyBatch = 45,
    /// Arithmetic overflow
    Overflow = 46,

    // ============================================
    // SETTLEMENT ERRORS (50-59)
    // ============================================
    /// Computed deltas do not net to the input amount
    UnbalancedSettlement = 50,

    // ============================================
    // OPERATIONAL ERRORS (60-69)
    // ============================================
    /// Contract is paused
    ContractPaused = 60,
}
