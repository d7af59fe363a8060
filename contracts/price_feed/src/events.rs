use soroban_sdk::{contracttype, Address};

use crate::storage::{Capability, TrancheClass};

#[contracttype]
#[derive(Clone, Debug)]
pub struct PriceUpdatedEvent {
    pub pool_id: u32,
    pub class: TrancheClass,
    pub price: i128,
    pub confidence_bps: u32,
    pub updater: Address,
    /// Set when the admin bypassed the deviation guard
    pub overridden: bool,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct FeedConfigChangedEvent {
    pub max_deviation_bps: u32,
    pub max_price_age: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct RoleChangedEvent {
    pub capability: Capability,
    pub account: Address,
    pub granted: bool,
}
