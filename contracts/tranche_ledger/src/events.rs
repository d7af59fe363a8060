use soroban_sdk::{contracttype, Address};

use crate::storage::TrancheClass;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnitsMintedEvent {
    pub pool_id: u32,
    pub class: TrancheClass,
    pub to: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnitsTransferredEvent {
    pub pool_id: u32,
    pub class: TrancheClass,
    pub from: Address,
    pub to: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OutstandingChangedEvent {
    pub pool_id: u32,
    pub class: TrancheClass,
    /// Signed delta: negative for write-downs
    pub delta: i128,
    pub outstanding_after: i128,
    pub total_collateral_after: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IncomeDonatedEvent {
    pub pool_id: u32,
    pub amount: i128,
    pub index_after: i128,
    pub undistributed_after: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IncomeClaimedEvent {
    pub pool_id: u32,
    pub holder: Address,
    pub amount: i128,
}
