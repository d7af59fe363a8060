#![no_std]

mod error;
mod events;
mod income;
mod storage;

pub use error::Error;
pub use income::INDEX_SCALE;
pub use storage::{HolderIncome, PoolIncome, Tranche, TrancheClass, TranchePool};

use events::{
    IncomeClaimedEvent, IncomeDonatedEvent, OutstandingChangedEvent, UnitsMintedEvent,
    UnitsTransferredEvent,
};
use storage::DataKey;

use soroban_sdk::{contract, contractimpl, token, Address, Env, Symbol};

#[contract]
pub struct TrancheLedger;

#[contractimpl]
impl TrancheLedger {
    /// Initialize the ledger
    ///
    /// `stablecoin` is the currency income donations are paid out in.
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    pub fn initialize(env: Env, admin: Address, stablecoin: Address) -> Result<(), Error> {
        if env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::AlreadyInitialized);
        }

        admin.require_auth();

        env.storage().instance().set(&DataKey::Initialized, &true);
        env.storage().instance().set(&DataKey::Admin, &admin);
        env.storage().instance().set(&DataKey::Stablecoin, &stablecoin);

        Ok(())
    }

    /// Add an operator (the securitization engine)
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn add_operator(env: Env, operator: Address) -> Result<(), Error> {
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        admin.require_auth();

        env.storage()
            .instance()
            .set(&DataKey::Operators(operator), &true);

        Ok(())
    }

    /// Remove an operator
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn remove_operator(env: Env, operator: Address) -> Result<(), Error> {
        let admin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Admin)
            .ok_or(Error::NotInitialized)?;
        admin.require_auth();

        env.storage()
            .instance()
            .remove(&DataKey::Operators(operator));

        Ok(())
    }

    // ============================================
    // OPERATOR FUNCTIONS
    // ============================================

    /// Mint tranche units and credit the backing value
    ///
    /// Units, the class' outstanding value and the pool's collateral value
    /// all move by `amount`. The pool is created on first mint.
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `NotOperator`: Caller is not an operator
    /// - `InvalidAmount`: Amount <= 0
    pub fn mint(
        env: Env,
        operator: Address,
        pool_id: u32,
        class: TrancheClass,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        Self::require_operator(&env, &operator)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        // Checkpoint income before the holder's unit count changes
        Self::settle_income(&env, pool_id, &to)?;

        let mut pool = Self::load_pool(&env, pool_id).unwrap_or(TranchePool::new(pool_id));
        let tranche = pool.tranche_mut(class);
        tranche.outstanding_value = tranche
            .outstanding_value
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        tranche.units_issued = tranche
            .units_issued
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        pool.total_collateral_value = pool
            .total_collateral_value
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        Self::save_pool(&env, &pool)?;

        let balance_key = DataKey::Balance(pool_id, class, to.clone());
        let new_balance = Self::balance_of(env.clone(), pool_id, class, to.clone())
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        env.storage().persistent().set(&balance_key, &new_balance);

        env.events().publish(
            (Symbol::new(&env, "mint"), pool_id),
            UnitsMintedEvent {
                pool_id,
                class,
                to,
                amount,
            },
        );

        Ok(())
    }

    /// Write down a tranche's outstanding value
    ///
    /// Unit balances are untouched; only the value behind them shrinks.
    ///
    /// # Errors
    /// - `NotOperator`: Caller is not an operator
    /// - `InvalidAmount`: Amount <= 0
    /// - `PoolNotFound`: Pool has never been minted into
    /// - `InsufficientOutstanding`: Amount exceeds the tranche's outstanding value
    pub fn debit_outstanding(
        env: Env,
        operator: Address,
        pool_id: u32,
        class: TrancheClass,
        amount: i128,
    ) -> Result<(), Error> {
        Self::require_operator(&env, &operator)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let mut pool = Self::load_pool(&env, pool_id).ok_or(Error::PoolNotFound)?;
        let tranche = pool.tranche_mut(class);
        if amount > tranche.outstanding_value {
            return Err(Error::InsufficientOutstanding);
        }
        tranche.outstanding_value -= amount;
        let outstanding_after = tranche.outstanding_value;
        pool.total_collateral_value = pool
            .total_collateral_value
            .checked_sub(amount)
            .ok_or(Error::Overflow)?;
        Self::save_pool(&env, &pool)?;

        env.events().publish(
            (Symbol::new(&env, "outstanding_debited"), pool_id),
            OutstandingChangedEvent {
                pool_id,
                class,
                delta: -amount,
                outstanding_after,
                total_collateral_after: pool.total_collateral_value,
            },
        );

        Ok(())
    }

    /// Raise a tranche's outstanding value without issuing units
    ///
    /// Not part of the loss flow: write-downs are never reversed.
    ///
    /// # Errors
    /// - `NotOperator`: Caller is not an operator
    /// - `InvalidAmount`: Amount <= 0
    /// - `PoolNotFound`: Pool has never been minted into
    pub fn credit_outstanding(
        env: Env,
        operator: Address,
        pool_id: u32,
        class: TrancheClass,
        amount: i128,
    ) -> Result<(), Error> {
        Self::require_operator(&env, &operator)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let mut pool = Self::load_pool(&env, pool_id).ok_or(Error::PoolNotFound)?;
        let tranche = pool.tranche_mut(class);
        tranche.outstanding_value = tranche
            .outstanding_value
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        let outstanding_after = tranche.outstanding_value;
        pool.total_collateral_value = pool
            .total_collateral_value
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        Self::save_pool(&env, &pool)?;

        env.events().publish(
            (Symbol::new(&env, "outstanding_credited"), pool_id),
            OutstandingChangedEvent {
                pool_id,
                class,
                delta: amount,
                outstanding_after,
                total_collateral_after: pool.total_collateral_value,
            },
        );

        Ok(())
    }

    /// Record income already transferred to this contract for a pool
    ///
    /// Income is credited pro rata to every unit of the pool regardless of
    /// class. It is not a tranche balance change.
    ///
    /// # Errors
    /// - `NotOperator`: Caller is not an operator
    /// - `InvalidAmount`: Amount <= 0
    /// - `PoolNotFound`: Pool has no units to credit
    pub fn donate(env: Env, operator: Address, pool_id: u32, amount: i128) -> Result<(), Error> {
        Self::require_operator(&env, &operator)?;

        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let pool = Self::load_pool(&env, pool_id).ok_or(Error::PoolNotFound)?;
        let total_units = pool.total_units().ok_or(Error::Overflow)?;

        let income_key = DataKey::PoolIncome(pool_id);
        let mut pool_income: PoolIncome = env
            .storage()
            .persistent()
            .get(&income_key)
            .unwrap_or_default();

        // Rounding left over from earlier donations rides along with this one
        let gross = amount
            .checked_add(pool_income.undistributed)
            .ok_or(Error::Overflow)?;
        let increment = income::index_increment(gross, total_units).ok_or(Error::PoolNotFound)?;
        let credited = income::credited_by(increment, total_units).ok_or(Error::Overflow)?;

        pool_income.index = pool_income
            .index
            .checked_add(increment)
            .ok_or(Error::Overflow)?;
        pool_income.total_donated = pool_income
            .total_donated
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        pool_income.undistributed = gross.checked_sub(credited).ok_or(Error::Overflow)?;
        env.storage().persistent().set(&income_key, &pool_income);

        env.events().publish(
            (Symbol::new(&env, "income_donated"), pool_id),
            IncomeDonatedEvent {
                pool_id,
                amount,
                index_after: pool_income.index,
                undistributed_after: pool_income.undistributed,
            },
        );

        Ok(())
    }

    // ============================================
    // HOLDER FUNCTIONS
    // ============================================

    /// Transfer tranche units between holders
    ///
    /// # Errors
    /// - `InvalidAmount`: Amount <= 0
    /// - `InsufficientBalance`: Not enough units
    pub fn transfer_units(
        env: Env,
        pool_id: u32,
        class: TrancheClass,
        from: Address,
        to: Address,
        amount: i128,
    ) -> Result<(), Error> {
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        from.require_auth();

        let from_balance = Self::balance_of(env.clone(), pool_id, class, from.clone());
        if from_balance < amount {
            return Err(Error::InsufficientBalance);
        }

        if from == to {
            return Ok(());
        }

        Self::settle_income(&env, pool_id, &from)?;
        Self::settle_income(&env, pool_id, &to)?;

        let new_from_balance = from_balance - amount;
        let new_to_balance = Self::balance_of(env.clone(), pool_id, class, to.clone())
            .checked_add(amount)
            .ok_or(Error::Overflow)?;

        let from_key = DataKey::Balance(pool_id, class, from.clone());
        if new_from_balance == 0 {
            env.storage().persistent().remove(&from_key);
        } else {
            env.storage().persistent().set(&from_key, &new_from_balance);
        }
        env.storage()
            .persistent()
            .set(&DataKey::Balance(pool_id, class, to.clone()), &new_to_balance);

        env.events().publish(
            (Symbol::new(&env, "transfer"), pool_id),
            UnitsTransferredEvent {
                pool_id,
                class,
                from,
                to,
                amount,
            },
        );

        Ok(())
    }

    /// Pay out a holder's accrued income for a pool
    ///
    /// Returns the amount paid (zero when nothing has accrued).
    pub fn claim_income(env: Env, holder: Address, pool_id: u32) -> Result<i128, Error> {
        holder.require_auth();

        let mut checkpoint = Self::settle_income(&env, pool_id, &holder)?;
        let amount = checkpoint.accrued;
        if amount == 0 {
            return Ok(0);
        }

        checkpoint.accrued = 0;
        env.storage()
            .persistent()
            .set(&DataKey::HolderIncome(pool_id, holder.clone()), &checkpoint);

        let stablecoin: Address = env
            .storage()
            .instance()
            .get(&DataKey::Stablecoin)
            .ok_or(Error::NotInitialized)?;
        token::Client::new(&env, &stablecoin).transfer(
            &env.current_contract_address(),
            &holder,
            &amount,
        );

        env.events().publish(
            (Symbol::new(&env, "income_claimed"), pool_id, holder.clone()),
            IncomeClaimedEvent {
                pool_id,
                holder,
                amount,
            },
        );

        Ok(amount)
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    pub fn balance_of(env: Env, pool_id: u32, class: TrancheClass, holder: Address) -> i128 {
        env.storage()
            .persistent()
            .get::<DataKey, i128>(&DataKey::Balance(pool_id, class, holder))
            .unwrap_or(0)
    }

    pub fn outstanding_value(env: Env, pool_id: u32, class: TrancheClass) -> i128 {
        Self::load_pool(&env, pool_id)
            .map(|pool| pool.tranche(class).outstanding_value)
            .unwrap_or(0)
    }

    pub fn units_issued(env: Env, pool_id: u32, class: TrancheClass) -> i128 {
        Self::load_pool(&env, pool_id)
            .map(|pool| pool.tranche(class).units_issued)
            .unwrap_or(0)
    }

    pub fn total_collateral_value(env: Env, pool_id: u32) -> i128 {
        Self::load_pool(&env, pool_id)
            .map(|pool| pool.total_collateral_value)
            .unwrap_or(0)
    }

    pub fn pool(env: Env, pool_id: u32) -> Option<TranchePool> {
        Self::load_pool(&env, pool_id)
    }

    /// Loss-adjusted value of a holder's units in one class
    pub fn claim_value(
        env: Env,
        pool_id: u32,
        class: TrancheClass,
        holder: Address,
    ) -> Result<i128, Error> {
        let Some(pool) = Self::load_pool(&env, pool_id) else {
            return Ok(0);
        };
        let units = Self::balance_of(env, pool_id, class, holder);
        let tranche = pool.tranche(class);
        income::claim_value(units, tranche.outstanding_value, tranche.units_issued)
            .ok_or(Error::Overflow)
    }

    /// Income a holder could claim right now
    pub fn pending_income(env: Env, pool_id: u32, holder: Address) -> Result<i128, Error> {
        let pool_income: PoolIncome = env
            .storage()
            .persistent()
            .get(&DataKey::PoolIncome(pool_id))
            .unwrap_or_default();
        let checkpoint: HolderIncome = env
            .storage()
            .persistent()
            .get(&DataKey::HolderIncome(pool_id, holder.clone()))
            .unwrap_or_default();
        let units = Self::holder_units(&env, pool_id, &holder)?;
        let fresh = income::accrued_between(units, pool_income.index, checkpoint.index)
            .ok_or(Error::Overflow)?;
        checkpoint.accrued.checked_add(fresh).ok_or(Error::Overflow)
    }

    pub fn pool_income(env: Env, pool_id: u32) -> PoolIncome {
        env.storage()
            .persistent()
            .get(&DataKey::PoolIncome(pool_id))
            .unwrap_or_default()
    }

    pub fn is_operator(env: Env, address: Address) -> bool {
        env.storage()
            .instance()
            .get::<DataKey, bool>(&DataKey::Operators(address))
            .unwrap_or(false)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    fn require_operator(env: &Env, operator: &Address) -> Result<(), Error> {
        if !env.storage().instance().has(&DataKey::Initialized) {
            return Err(Error::NotInitialized);
        }
        if !Self::is_operator(env.clone(), operator.clone()) {
            return Err(Error::NotOperator);
        }
        operator.require_auth();
        Ok(())
    }

    fn load_pool(env: &Env, pool_id: u32) -> Option<TranchePool> {
        env.storage().persistent().get(&DataKey::Pool(pool_id))
    }

    fn save_pool(env: &Env, pool: &TranchePool) -> Result<(), Error> {
        if !pool.is_conserved() {
            return Err(Error::ConservationViolated);
        }
        env.storage()
            .persistent()
            .set(&DataKey::Pool(pool.pool_id), pool);
        Ok(())
    }

    fn holder_units(env: &Env, pool_id: u32, holder: &Address) -> Result<i128, Error> {
        let mut units: i128 = 0;
        for class in [
            TrancheClass::Senior,
            TrancheClass::Mezzanine,
            TrancheClass::Equity,
        ] {
            units = units
                .checked_add(Self::balance_of(env.clone(), pool_id, class, holder.clone()))
                .ok_or(Error::Overflow)?;
        }
        Ok(units)
    }

    /// Move income earned since the holder's last checkpoint into `accrued`
    fn settle_income(env: &Env, pool_id: u32, holder: &Address) -> Result<HolderIncome, Error> {
        let pool_income: PoolIncome = env
            .storage()
            .persistent()
            .get(&DataKey::PoolIncome(pool_id))
            .unwrap_or_default();

        let key = DataKey::HolderIncome(pool_id, holder.clone());
        let mut checkpoint: HolderIncome = env.storage().persistent().get(&key).unwrap_or_default();
        if checkpoint.index == pool_income.index {
            return Ok(checkpoint);
        }

        let units = Self::holder_units(env, pool_id, holder)?;
        let fresh = income::accrued_between(units, pool_income.index, checkpoint.index)
            .ok_or(Error::Overflow)?;
        checkpoint.accrued = checkpoint.accrued.checked_add(fresh).ok_or(Error::Overflow)?;
        checkpoint.index = pool_income.index;
        env.storage().persistent().set(&key, &checkpoint);

        Ok(checkpoint)
    }
}
