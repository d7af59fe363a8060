use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // Initialization errors
    AlreadyInitialized = 1,
    NotInitialized = 2,

    // Authorization errors
    NotOperator = 11,

    // Lookup errors
    PoolNotFound = 20,

    // Balance errors
    InvalidAmount = 30,
    InsufficientBalance = 31,
    /// Write-down larger than the tranche's outstanding value
    InsufficientOutstanding = 32,
    Overflow = 33,

    // Invariant errors
    /// Tranche outstanding values no longer sum to the pool's collateral value
    ConservationViolated = 40,
}
