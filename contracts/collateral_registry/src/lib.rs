#![no_std]

mod error;
mod events;
mod storage;

pub use error::Error;
pub use storage::{Instrument, MortgageDetails, RiskAttributes};

use events::{InstrumentCreatedEvent, InstrumentTransferredEvent};
use storage::{DataKey, BASIS_POINTS, MAX_TERM_MONTHS};

use soroban_sdk::{contract, contractimpl, Address, Env, Symbol};

#[contract]
pub struct CollateralRegistry;

#[contractimpl]
impl CollateralRegistry {
    /// Initialize the registry
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    pub fn initialize(env: Env, admin: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::InstrumentCounter, &0u64);

        Ok(())
    }

    /// Allow `originator` to record new instruments
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn add_originator(env: Env, originator: Address) -> Result<(), Error> {
        let admin = Self::admin(&env)?;
        admin.require_auth();

        env.storage()
            .instance()
            .set(&DataKey::Originator(originator), &true);

        Ok(())
    }

    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn remove_originator(env: Env, originator: Address) -> Result<(), Error> {
        let admin = Self::admin(&env)?;
        admin.require_auth();

        env.storage()
            .instance()
            .remove(&DataKey::Originator(originator));

        Ok(())
    }

    /// Record a new mortgage instrument owned by `owner`
    ///
    /// Instrument ids start at 1 and are never reused.
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `NotOriginator`: Caller is not a registered originator
    /// - `InvalidDetails`: Principal, term, rate or risk attributes out of range
    pub fn create(
        env: Env,
        originator: Address,
        owner: Address,
        details: MortgageDetails,
    ) -> Result<u64, Error> {
        if !env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::NotInitialized);
        }

        originator.require_auth();

        if !Self::is_originator(env.clone(), originator.clone()) {
            return Err(Error::NotOriginator);
        }

        check_details(&details)?;

        let counter: u64 = env
            .storage()
            .instance()
            .get(&DataKey::InstrumentCounter)
            .unwrap_or(0);
        let instrument_id = counter.checked_add(1).ok_or(Error::Overflow)?;

        let principal = details.principal;
        let instrument = Instrument {
            id: instrument_id,
            owner: owner.clone(),
            details,
            created_at: env.ledger().timestamp(),
        };

        env.storage()
            .persistent()
            .set(&DataKey::Instrument(instrument_id), &instrument);
        env.storage()
            .instance()
            .set(&DataKey::InstrumentCounter, &instrument_id);

        env.events().publish(
            (Symbol::new(&env, "instrument_created"), instrument_id),
            InstrumentCreatedEvent {
                instrument_id,
                originator,
                owner,
                principal,
            },
        );

        Ok(instrument_id)
    }

    /// Move custody of an instrument
    ///
    /// # Errors
    /// - `NotFound`: Unknown instrument id
    /// - `NotOwner`: `from` does not currently hold the instrument
    pub fn transfer(env: Env, instrument_id: u64, from: Address, to: Address) -> Result<(), Error> {
        from.require_auth();

        let key = DataKey::Instrument(instrument_id);
        let mut instrument: Instrument = env
            .storage()
            .persistent()
            .get(&key)
            .ok_or(Error::NotFound)?;

        if instrument.owner != from {
            return Err(Error::NotOwner);
        }

        instrument.owner = to.clone();
        env.storage().persistent().set(&key, &instrument);

        env.events().publish(
            (Symbol::new(&env, "instrument_transferred"), instrument_id),
            InstrumentTransferredEvent {
                instrument_id,
                from,
                to,
            },
        );

        Ok(())
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    pub fn owner_of(env: Env, instrument_id: u64) -> Result<Address, Error> {
        Ok(Self::get_instrument(env, instrument_id)?.owner)
    }

    pub fn details_of(env: Env, instrument_id: u64) -> Result<MortgageDetails, Error> {
        Ok(Self::get_instrument(env, instrument_id)?.details)
    }

    pub fn get_instrument(env: Env, instrument_id: u64) -> Result<Instrument, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Instrument(instrument_id))
            .ok_or(Error::NotFound)
    }

    pub fn instrument_count(env: Env) -> u64 {
        env.storage()
            .instance()
            .get(&DataKey::InstrumentCounter)
            .unwrap_or(0)
    }

    pub fn is_originator(env: Env, address: Address) -> bool {
        env.storage()
            .instance()
            .get::<DataKey, bool>(&DataKey::Originator(address))
            .unwrap_or(false)
    }

    fn admin(env: &Env) -> Result<Address, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)
    }
}

fn check_details(details: &MortgageDetails) -> Result<(), Error> {
    if details.principal <= 0 {
        return Err(Error::InvalidDetails);
    }
    if details.term_months == 0 || details.term_months > MAX_TERM_MONTHS {
        return Err(Error::InvalidDetails);
    }
    if details.rate_bps > BASIS_POINTS
        || details.risk.ltv_bps > BASIS_POINTS
        || details.risk.dti_bps > BASIS_POINTS
    {
        return Err(Error::InvalidDetails);
    }
    Ok(())
}
