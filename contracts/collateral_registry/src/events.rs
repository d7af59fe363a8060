use soroban_sdk::{contracttype, Address};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstrumentCreatedEvent {
    pub instrument_id: u64,
    pub originator: Address,
    pub owner: Address,
    pub principal: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InstrumentTransferredEvent {
    pub instrument_id: u64,
    pub from: Address,
    pub to: Address,
}
