#![no_std]

mod error;
mod events;
mod storage;
mod validation;

pub use error::Error;
pub use storage::{
    Capability, FeedConfig, PriceQuote, PriceUpdate, TrancheClass, DEFAULT_MAX_DEVIATION_BPS,
    DEFAULT_MAX_PRICE_AGE, PRICE_SCALE,
};

use events::*;
use storage::{DataKey, BASIS_POINTS};
use validation::{deviation_bps, exceeds_deviation, is_stale};

use soroban_sdk::{contract, contractimpl, log, Address, Env, Symbol, Vec};

#[contract]
pub struct PriceFeed;

#[contractimpl]
impl PriceFeed {
    // ============================================
    // INITIALIZATION & ADMIN
    // ============================================

    /// Initialize with a 5% deviation bound and a one hour staleness cutoff
    pub fn initialize(env: Env, admin: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        let config = FeedConfig {
            admin,
            max_deviation_bps: DEFAULT_MAX_DEVIATION_BPS,
            max_price_age: DEFAULT_MAX_PRICE_AGE,
        };

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Config, &config);
        env.storage().instance().set(&DataKey::Paused, &false);

        Ok(())
    }

    pub fn pause(env: Env) -> Result<(), Error> {
        let config = Self::config(&env)?;
        config.admin.require_auth();

        env.storage().instance().set(&DataKey::Paused, &true);
        Ok(())
    }

    pub fn unpause(env: Env) -> Result<(), Error> {
        let config = Self::config(&env)?;
        config.admin.require_auth();

        env.storage().instance().set(&DataKey::Paused, &false);
        Ok(())
    }

    /// # Errors
    /// - `InvalidDeviation`: Bound outside 1..=10,000 basis points
    pub fn set_max_deviation_bps(env: Env, max_deviation_bps: u32) -> Result<(), Error> {
        let mut config = Self::config(&env)?;
        config.admin.require_auth();

        if max_deviation_bps == 0 || max_deviation_bps as i128 > BASIS_POINTS {
            return Err(Error::InvalidDeviation);
        }

        config.max_deviation_bps = max_deviation_bps;
        Self::save_config(&env, &config);
        Ok(())
    }

    /// # Errors
    /// - `InvalidMaxAge`: Age must be positive
    pub fn set_max_price_age(env: Env, max_price_age: u64) -> Result<(), Error> {
        let mut config = Self::config(&env)?;
        config.admin.require_auth();

        if max_price_age == 0 {
            return Err(Error::InvalidMaxAge);
        }

        config.max_price_age = max_price_age;
        Self::save_config(&env, &config);
        Ok(())
    }

    pub fn grant_role(env: Env, capability: Capability, account: Address) -> Result<(), Error> {
        let config = Self::config(&env)?;
        config.admin.require_auth();

        env.storage()
            .instance()
            .set(&DataKey::Role(capability, account.clone()), &true);

        env.events().publish(
            (Symbol::new(&env, "role_granted"),),
            RoleChangedEvent {
                capability,
                account,
                granted: true,
            },
        );
        Ok(())
    }

    pub fn revoke_role(env: Env, capability: Capability, account: Address) -> Result<(), Error> {
        let config = Self::config(&env)?;
        config.admin.require_auth();

        env.storage()
            .instance()
            .remove(&DataKey::Role(capability, account.clone()));

        env.events().publish(
            (Symbol::new(&env, "role_revoked"),),
            RoleChangedEvent {
                capability,
                account,
                granted: false,
            },
        );
        Ok(())
    }

    // ============================================
    // QUOTE PUBLICATION
    // ============================================

    /// Publish a tranche quote
    ///
    /// The first quote for a tranche is accepted as is; later quotes must
    /// stay within `max_deviation_bps` of the previous price, however old.
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `Unauthorized`: Updater lacks `ReportsPrice`
    /// - `InvalidPrice`: Price <= 0
    /// - `InvalidConfidence`: Confidence above 10,000 bps
    /// - `DeviationExceeded`: Move beyond the configured bound
    pub fn update_price(
        env: Env,
        updater: Address,
        pool_id: u32,
        class: TrancheClass,
        price: i128,
        confidence_bps: u32,
    ) -> Result<PriceQuote, Error> {
        Self::check_not_paused(&env)?;
        let config = Self::config(&env)?;

        updater.require_auth();
        Self::require_role(&env, &updater)?;

        Self::publish(&env, &config, updater, pool_id, class, price, confidence_bps, false)
    }

    /// Publish several quotes; the first rejected item aborts the batch
    ///
    /// # Errors
    /// - `EmptyBatch`: No updates given
    /// - Any error of `update_price`
    pub fn update_prices(env: Env, updater: Address, updates: Vec<PriceUpdate>) -> Result<u32, Error> {
        Self::check_not_paused(&env)?;
        let config = Self::config(&env)?;

        if updates.is_empty() {
            return Err(Error::EmptyBatch);
        }

        updater.require_auth();
        Self::require_role(&env, &updater)?;

        for update in updates.iter() {
            Self::publish(
                &env,
                &config,
                updater.clone(),
                update.pool_id,
                update.class,
                update.price,
                update.confidence_bps,
                false,
            )?;
        }

        Ok(updates.len())
    }

    /// Admin recovery path that skips the deviation guard
    ///
    /// Used when the market has legitimately moved beyond the bound, for
    /// example after a long feed outage.
    pub fn override_price(
        env: Env,
        pool_id: u32,
        class: TrancheClass,
        price: i128,
        confidence_bps: u32,
    ) -> Result<PriceQuote, Error> {
        let config = Self::config(&env)?;
        config.admin.require_auth();

        let admin = config.admin.clone();
        Self::publish(&env, &config, admin, pool_id, class, price, confidence_bps, true)
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    /// Read a fresh quote
    ///
    /// # Errors
    /// - `PriceUnavailable`: Never published
    /// - `PriceStale`: Older than `max_price_age`
    pub fn get_price(env: Env, pool_id: u32, class: TrancheClass) -> Result<PriceQuote, Error> {
        let config = Self::config(&env)?;

        let quote: PriceQuote = env
            .storage()
            .persistent()
            .get(&DataKey::Quote(pool_id, class))
            .ok_or(Error::PriceUnavailable)?;

        if is_stale(quote.timestamp, env.ledger().timestamp(), config.max_price_age) {
            return Err(Error::PriceStale);
        }

        Ok(quote)
    }

    /// Last published quote regardless of age
    pub fn last_quote(env: Env, pool_id: u32, class: TrancheClass) -> Option<PriceQuote> {
        env.storage().persistent().get(&DataKey::Quote(pool_id, class))
    }

    pub fn get_config(env: Env) -> Result<FeedConfig, Error> {
        Self::config(&env)
    }

    pub fn has_role(env: Env, capability: Capability, account: Address) -> bool {
        env.storage()
            .instance()
            .get::<DataKey, bool>(&DataKey::Role(capability, account))
            .unwrap_or(false)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    #[allow(clippy::too_many_arguments)]
    fn publish(
        env: &Env,
        config: &FeedConfig,
        updater: Address,
        pool_id: u32,
        class: TrancheClass,
        price: i128,
        confidence_bps: u32,
        overridden: bool,
    ) -> Result<PriceQuote, Error> {
        if price <= 0 {
            return Err(Error::InvalidPrice);
        }
        if confidence_bps as i128 > BASIS_POINTS {
            return Err(Error::InvalidConfidence);
        }

        let key = DataKey::Quote(pool_id, class);
        if !overridden {
            if let Some(previous) = env.storage().persistent().get::<DataKey, PriceQuote>(&key) {
                if exceeds_deviation(previous.price, price, config.max_deviation_bps) {
                    log!(
                        env,
                        "price update rejected",
                        pool_id,
                        deviation_bps(previous.price, price).unwrap_or(i128::MAX)
                    );
                    return Err(Error::DeviationExceeded);
                }
            }
        }

        let quote = PriceQuote {
            pool_id,
            class,
            price,
            confidence_bps,
            timestamp: env.ledger().timestamp(),
            updater: updater.clone(),
        };
        env.storage().persistent().set(&key, &quote);

        env.events().publish(
            (Symbol::new(env, "price_updated"), pool_id),
            PriceUpdatedEvent {
                pool_id,
                class,
                price,
                confidence_bps,
                updater,
                overridden,
            },
        );

        Ok(quote)
    }

    fn config(env: &Env) -> Result<FeedConfig, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Config)
            .ok_or(Error::NotInitialized)
    }

    fn save_config(env: &Env, config: &FeedConfig) {
        env.storage().instance().set(&DataKey::Config, config);

        env.events().publish(
            (Symbol::new(env, "feed_config"),),
            FeedConfigChangedEvent {
                max_deviation_bps: config.max_deviation_bps,
                max_price_age: config.max_price_age,
            },
        );
    }

    fn check_not_paused(env: &Env) -> Result<(), Error> {
        let paused = env
            .storage()
            .instance()
            .get::<DataKey, bool>(&DataKey::Paused)
            .unwrap_or(false);

        if paused {
            return Err(Error::ContractPaused);
        }
        Ok(())
    }

    fn require_role(env: &Env, account: &Address) -> Result<(), Error> {
        if !Self::has_role(env.clone(), Capability::ReportsPrice, account.clone()) {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }
}
