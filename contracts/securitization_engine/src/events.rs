use soroban_sdk::{contracttype, Address};

use crate::storage::Capability;

#[contracttype]
#[derive(Clone, Debug)]
pub struct SecuritizedEvent {
    pub instrument_id: u64,
    pub investor: Address,
    pub pool_id: u32,
    pub principal: i128,
    pub senior: i128,
    pub mezzanine: i128,
    pub equity: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct LossRegisteredEvent {
    pub pool_id: u32,
    pub reporter: Address,
    pub requested: i128,
    pub equity: i128,
    pub mezzanine: i128,
    pub senior: i128,
    pub shortfall: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PaymentDistributedEvent {
    pub instrument_id: u64,
    pub payer: Address,
    pub amount: i128,
    pub fee: i128,
    pub per_pool: i128,
    pub pool_count: u32,
    pub dust: i128,
    pub principal_remaining: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct ScheduleUpdatedEvent {
    pub instrument_id: u64,
    pub missed_periods: u32,
    pub active: bool,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct RoleChangedEvent {
    pub capability: Capability,
    pub account: Address,
    pub granted: bool,
}
