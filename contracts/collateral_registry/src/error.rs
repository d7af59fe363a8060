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
    /// `from` does not hold the instrument
    NotOwner = 11,
    /// Caller is not a registered originator
    NotOriginator = 12,

    // ============================================
    // LOOKUP ERRORS (20-29)
    // ============================================
    /// Unknown instrument id
    NotFound = 20,

    // ============================================
    // INPUT ERRORS (30-39)
    // ============================================
    /// Principal, term, rate or risk attributes out of range
    InvalidDetails = 30,
    /// Instrument id counter exhausted
    Overflow = 31,
}
