use soroban_sdk::{contracttype, Address};

// Constants
pub const BASIS_POINTS: i128 = 10_000; // 100% = 10,000 basis points
/// Fixed-point scale of quoted prices (1e18 = $1.00)
pub const PRICE_SCALE: i128 = 1_000_000_000_000_000_000;

pub const DEFAULT_MAX_DEVIATION_BPS: u32 = 500; // 5% per update
pub const DEFAULT_MAX_PRICE_AGE: u64 = 3600; // 1 hour

/// Tranche classes, wire-compatible with the tranche ledger's enum.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TrancheClass {
    Senior = 0,
    Mezzanine = 1,
    Equity = 2,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Capability {
    /// May publish tranche quotes
    ReportsPrice = 0,
}

/// Latest fair-value quote for one tranche of one pool
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PriceQuote {
    pub pool_id: u32,
    pub class: TrancheClass,
    /// Scaled by `PRICE_SCALE`
    pub price: i128,
    /// 0 - 10,000 basis points
    pub confidence_bps: u32,
    pub timestamp: u64,
    pub updater: Address,
}

/// One item of a batch update
#[contracttype]
#[derive(Clone, Debug)]
pub struct PriceUpdate {
    pub pool_id: u32,
    pub class: TrancheClass,
    pub price: i128,
    pub confidence_bps: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeedConfig {
    pub admin: Address,
    /// Largest allowed move per update
    pub max_deviation_bps: u32,
    /// Seconds after which a quote is rejected on read
    pub max_price_age: u64,
}

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Config,
    Initialized,
    Paused,
    Role(Capability, Address),
    Quote(u32, TrancheClass), // (pool_id, class) → PriceQuote
}
