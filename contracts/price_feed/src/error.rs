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
    // AUTHORIZATION ERRORS (10-15)
    // ============================================
    /// Caller lacks the `ReportsPrice` capability
    Unauthorized = 10,

    // ============================================
    // INPUT ERRORS (20-29)
    // ============================================
    /// Price must be positive
    InvalidPrice = 20,
    /// Confidence above 10,000 basis points
    InvalidConfidence = 21,
    /// Deviation bound must be 1..=10,000 basis points
    InvalidDeviation = 22,
    /// Maximum price age must be positive
    InvalidMaxAge = 23,
    /// Batch contains no updates
    EmptyBatch = 24,

    // ============================================
    // ORACLE GUARD ERRORS (30-39)
    // ============================================
    /// New price jumps too far from the previous one
    DeviationExceeded = 30,

    // ============================================
    // READ ERRORS (40-49)
    // ============================================
    /// No quote was ever published for this tranche
    PriceUnavailable = 40,
    /// Quote is older than the maximum price age
    PriceStale = 41,

    // ============================================
    // OPERATIONAL ERRORS (50-59)
    // ============================================
    /// Contract is paused
    ContractPaused = 50,
}
