//! Action reducer and the position and activity ledgers fed by it.

use alloy::primitives::{Address, U256};

use super::{
    Action, ActionType, Applied, BucketSpan, Fee, FeeSide, Metadata, OptionActivity,
    OptionFactory, OptionHelper, OptionSeries, OptionType, Pool, PoolFactory, Position,
    ProtocolEvents, SkipReason, SpotPrice, User, indexer::Reduction,
};
use crate::{
    abi::{
        helper::OptionHelper::{OptionsBought, OptionsMintedAndSold, OptionsSold},
        option::PodOption::{Exercise, Mint, Transfer, Unmint, Withdraw},
        pool::OptionAMMPool::{AddLiquidity, RemoveLiquidity},
    },
    ids, num,
    reader::ContractReader,
    store::{Store, StoreExt},
    types::EventContext,
};

/// Entities an action is recorded against.
pub(super) struct Parties {
    pub(super) user: User,
    pub(super) option: OptionSeries,
    pub(super) pool: Option<Pool>,
}

fn missing(r#type: ActionType, ctx: &EventContext<ProtocolEvents>) -> Applied {
    tracing::debug!(
        action = %r#type,
        tx = %ctx.tx_hash(),
        log_index = ctx.log_index(),
        "linked entities are missing"
    );
    Applied::Skipped(SkipReason::MissingDependency)
}

impl<S: Store, R: ContractReader> Reduction<'_, S, R> {
    pub(super) async fn buy(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        event: &OptionsBought,
    ) -> Applied {
        let Some(parties) = self.option_parties(event.buyer, event.optionAddress) else {
            return missing(ActionType::Buy, ctx);
        };
        let mut action = self.base_action(ctx, ActionType::Buy, &parties);
        action.input_token_b = event.inputSold;
        action.output_token_a = event.optionsBought;
        self.record(action, &parties, event.optionsBought).await
    }

    /// Mint and sell in one step, superseding the mint of the same transaction.
    pub(super) async fn sell(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        event: &OptionsMintedAndSold,
    ) -> Applied {
        let Some(parties) = self.option_parties(event.seller, event.optionAddress) else {
            return missing(ActionType::Sell, ctx);
        };
        self.collapse_mint(ctx);

        let amount = event.optionsMintedAndSold;
        let mut action = self.base_action(ctx, ActionType::Sell, &parties);
        action.output_token_b = event.outputBought;
        match parties.option.r#type {
            OptionType::Put => action.input_token_b = self.strike_amount(&parties, amount),
            OptionType::Call => action.input_token_a = amount,
        }

        let mut metadata = self.metadata_or_empty(&ctx.tx_id());
        metadata.options_minted_and_sold = Some(amount);
        action.metadata = Some(metadata.id.clone());
        self.batch.upsert(metadata);

        self.record(action, &parties, amount).await
    }

    pub(super) async fn resell(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        event: &OptionsSold,
    ) -> Applied {
        let Some(parties) = self.option_parties(event.seller, event.optionAddress) else {
            return missing(ActionType::Resell, ctx);
        };
        let mut action = self.base_action(ctx, ActionType::Resell, &parties);
        action.input_token_a = event.optionsSold;
        action.output_token_b = event.outputReceived;
        self.record(action, &parties, event.optionsSold).await
    }

    pub(super) async fn mint(&mut self, ctx: &EventContext<ProtocolEvents>, event: &Mint) -> Applied {
        let Some(parties) = self.option_parties(event.minter, ctx.address()) else {
            return missing(ActionType::Mint, ctx);
        };
        let mut action = self.base_action(ctx, ActionType::Mint, &parties);
        action.output_token_a = event.amount;
        match parties.option.r#type {
            OptionType::Put => action.input_token_b = self.strike_amount(&parties, event.amount),
            OptionType::Call => action.input_token_a = event.amount,
        }
        self.record(action, &parties, event.amount).await
    }

    pub(super) async fn unmint(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        event: &Unmint,
    ) -> Applied {
        let Some(parties) = self.option_parties(event.minter, ctx.address()) else {
            return missing(ActionType::Unmint, ctx);
        };
        let mut action = self.base_action(ctx, ActionType::Unmint, &parties);
        action.input_token_a = event.optionAmount;
        match parties.option.r#type {
            OptionType::Put => action.output_token_b = event.strikeAmount,
            OptionType::Call => action.output_token_a = event.optionAmount,
        }
        self.record(action, &parties, event.optionAmount).await
    }

    /// Exercise is attributed to the transaction sender.
    pub(super) async fn exercise(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        event: &Exercise,
    ) -> Applied {
        let Some(parties) = self.option_parties(ctx.tx_from(), ctx.address()) else {
            return missing(ActionType::Exercise, ctx);
        };
        let mut action = self.base_action(ctx, ActionType::Exercise, &parties);
        let settlement = self.strike_amount(&parties, event.amount);
        action.input_token_a = event.amount;
        match parties.option.r#type {
            OptionType::Put => action.output_token_b = settlement,
            OptionType::Call => {
                action.input_token_b = settlement;
                action.output_token_a = event.amount;
            }
        }
        self.record(action, &parties, U256::ZERO).await
    }

    pub(super) async fn withdraw(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        event: &Withdraw,
    ) -> Applied {
        let Some(parties) = self.option_parties(event.minter, ctx.address()) else {
            return missing(ActionType::Withdraw, ctx);
        };
        let mut action = self.base_action(ctx, ActionType::Withdraw, &parties);
        action.output_token_a = event.underlyingAmount;
        action.output_token_b = event.strikeAmount;
        self.record(action, &parties, U256::ZERO).await
    }

    /// Liquidity provision, superseding the mint of the same transaction.
    pub(super) async fn add_liquidity(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        event: &AddLiquidity,
    ) -> Applied {
        let Some(parties) = self.pool_parties(event.owner, ctx.address()) else {
            return missing(ActionType::AddLiquidity, ctx);
        };
        self.collapse_mint(ctx);

        let mut action = self.base_action(ctx, ActionType::AddLiquidity, &parties);
        action.input_token_a = event.amountA;
        action.input_token_b = event.amountB;
        self.record(action, &parties, event.amountA).await
    }

    pub(super) async fn remove_liquidity(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        event: &RemoveLiquidity,
    ) -> Applied {
        let Some(parties) = self.pool_parties(event.caller, ctx.address()) else {
            return missing(ActionType::RemoveLiquidity, ctx);
        };
        let mut action = self.base_action(ctx, ActionType::RemoveLiquidity, &parties);
        action.output_token_a = event.amountA;
        action.output_token_b = event.amountB;
        self.record(action, &parties, event.amountA).await
    }

    /// Wallet to wallet option transfer, recorded as a receiving and a sending leg.
    pub(super) async fn transfer(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        event: &Transfer,
    ) -> Applied {
        if !self.options.track_transfers {
            return Applied::Skipped(SkipReason::Disabled);
        }
        let Some(option) = self
            .batch
            .load::<OptionSeries>(&ids::address_id(ctx.address()))
        else {
            return missing(ActionType::TransferTo, ctx);
        };
        if !self.is_wallet(event.from) || !self.is_wallet(event.to) {
            return Applied::Skipped(SkipReason::Ignored);
        }
        if self.batch.contains::<Action>(&ctx.tx_id()) {
            tracing::debug!(tx = %ctx.tx_hash(), "transfer of a transaction with actions");
            return Applied::Skipped(SkipReason::Duplicate);
        }

        let pool = option
            .pool
            .as_deref()
            .and_then(|id| self.batch.load::<Pool>(id));
        let receiver = Parties {
            user: self.get_or_create_user(event.to),
            option: option.clone(),
            pool: pool.clone(),
        };
        let sender = Parties {
            user: self.get_or_create_user(event.from),
            option,
            pool,
        };

        let mut received = self.base_action(ctx, ActionType::TransferTo, &receiver);
        received.output_token_a = event.value;
        self.record(received, &receiver, U256::ZERO).await;

        let mut sent = self.base_action(ctx, ActionType::TransferFrom, &sender);
        sent.input_token_a = event.value;
        self.record(sent, &sender, U256::ZERO).await
    }

    /// Whether the address is an ordinary wallet rather than the zero address
    /// or a protocol contract.
    fn is_wallet(&self, address: Address) -> bool {
        if address.is_zero() {
            return false;
        }
        let id = ids::address_id(address);
        !(self.batch.contains::<OptionFactory>(&id)
            || self.batch.contains::<OptionHelper>(&id)
            || self.batch.contains::<PoolFactory>(&id)
            || self.batch.contains::<OptionSeries>(&id)
            || self.batch.contains::<Pool>(&id))
    }

    /// Resolves the option by address and its pool, creating the user.
    fn option_parties(&mut self, user: Address, option: Address) -> Option<Parties> {
        let option = self.batch.load::<OptionSeries>(&ids::address_id(option))?;
        let pool = self.batch.load::<Pool>(option.pool.as_deref()?)?;
        Some(Parties {
            user: self.get_or_create_user(user),
            option,
            pool: Some(pool),
        })
    }

    /// Resolves the pool by address and its option, creating the user.
    fn pool_parties(&mut self, user: Address, pool: Address) -> Option<Parties> {
        let pool = self.batch.load::<Pool>(&ids::address_id(pool))?;
        let option = self.batch.load::<OptionSeries>(&pool.option)?;
        Some(Parties {
            user: self.get_or_create_user(user),
            option,
            pool: Some(pool),
        })
    }

    pub(super) fn get_or_create_user(&mut self, address: Address) -> User {
        let id = ids::address_id(address);
        if let Some(user) = self.batch.load::<User>(&id) {
            return user;
        }
        let user = User::at(address);
        self.batch.upsert(user.clone());
        user
    }

    pub(super) fn metadata_or_empty(&self, tx_id: &str) -> Metadata {
        self.batch
            .load::<Metadata>(tx_id)
            .unwrap_or_else(|| Metadata::empty(tx_id.to_string()))
    }

    /// Converts an option amount into strike token units of the pool.
    fn strike_amount(&self, parties: &Parties, amount: U256) -> U256 {
        let decimals = parties
            .pool
            .as_ref()
            .map_or(parties.option.decimals, |p| p.token_a_decimals);
        num::strike_amount(parties.option.strike_price, amount, decimals)
    }

    /// Deletes the mint recorded under the bare transaction id, if any,
    /// together with its activity counts. Position increments stay.
    fn collapse_mint(&mut self, ctx: &EventContext<ProtocolEvents>) {
        let tx_id = ctx.tx_id();
        let Some(mint) = self
            .batch
            .load::<Action>(&tx_id)
            .filter(|a| a.r#type == ActionType::Mint)
        else {
            return;
        };
        tracing::debug!(tx = %ctx.tx_hash(), "mint superseded");
        self.batch.delete::<Action>(&tx_id);

        if self.options.track_activity
            && let Some(option_id) = &mint.option
        {
            self.retract_activity(&mint, option_id);
        }
    }

    /// Removes the counts a superseded mint added to its hour and day buckets.
    fn retract_activity(&mut self, mint: &Action, option_id: &str) {
        for span in BucketSpan::ALL {
            let index = ids::bucket_index(mint.timestamp, span);
            let Some(mut bucket) = self
                .batch
                .load::<OptionActivity>(&ids::activity_id(option_id, span, index))
            else {
                continue;
            };
            bucket.retract(mint, mint.output_token_a);
            self.batch.upsert(bucket);
        }
    }

    /// Picks the first free identifier for another action of the transaction.
    ///
    /// The first action keeps the bare transaction id, the sending leg of
    /// a transfer always takes the fixed transfer suffix.
    fn allocate_action_id(&self, ctx: &EventContext<ProtocolEvents>, r#type: ActionType) -> String {
        let tx_id = ctx.tx_id();
        if r#type == ActionType::TransferFrom {
            return ids::action_id(&tx_id, Some(ids::TRANSFER_FROM_SUFFIX));
        }
        let bare = ids::action_id(&tx_id, None);
        if !self.batch.contains::<Action>(&bare) {
            return bare;
        }
        let typed = ids::action_id(&tx_id, Some(&r#type.to_string()));
        if !self.batch.contains::<Action>(&typed) {
            return typed;
        }
        ids::action_id(&tx_id, Some(&format!("{}-{}", r#type, ctx.log_index())))
    }

    /// New action linked to its parties and to the auxiliary entities
    /// already recorded for the transaction.
    fn base_action(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        r#type: ActionType,
        parties: &Parties,
    ) -> Action {
        let tx_id = ctx.tx_id();
        let mut action = Action::new(
            self.allocate_action_id(ctx, r#type),
            r#type,
            ctx.tx_from(),
            ctx.tx_hash(),
            self.instant.block_timestamp(),
        );
        action.user = Some(parties.user.id.clone());
        action.option = Some(parties.option.id.clone());
        action.pool = parties.pool.as_ref().map(|p| p.id.clone());
        action.option_type = Some(parties.option.r#type);

        if action.id == tx_id
            && let Some(mut price) = self.batch.load::<SpotPrice>(&tx_id)
        {
            price.action = Some(action.id.clone());
            action.spot_price = Some(price.id.clone());
            self.batch.upsert(price);
        }

        if self.batch.contains::<Metadata>(&tx_id) {
            action.metadata = Some(tx_id.clone());
        }
        for side in FeeSide::ALL {
            let Some(mut fee) = self.batch.load::<Fee>(&ids::fee_id(&tx_id, side)) else {
                continue;
            };
            let mut metadata = self.metadata_or_empty(&tx_id);
            metadata.link_fee(side, fee.id.clone());
            fee.metadata = Some(metadata.id.clone());
            fee.action = Some(action.id.clone());
            action.metadata = Some(metadata.id.clone());
            self.batch.upsert(fee);
            self.batch.upsert(metadata);
        }

        action
    }

    /// Feeds the action to the ledgers and the live tracker, then saves it.
    async fn record(&mut self, mut action: Action, parties: &Parties, reference: U256) -> Applied {
        self.update_position(&action, parties, reference).await;
        if self.options.track_activity {
            self.update_activity(&action, &parties.option, reference);
        }
        if self.options.live_tracking
            && let Some(pool) = &parties.pool
        {
            self.track(&mut action, &parties.user, &parties.option, pool, reference)
                .await;
        }
        tracing::debug!(action = %action.id, action_type = %action.r#type, "action recorded");
        self.batch.upsert(action);
        Applied::Done
    }

    async fn update_position(&mut self, action: &Action, parties: &Parties, reference: U256) {
        let (user, option) = (&parties.user, &parties.option);
        let mut position = self
            .batch
            .load::<Position>(&ids::position_id(&user.id, &option.id))
            .unwrap_or_else(|| Position::open(user, option));
        position.apply(action, reference);

        if action.r#type.affects_liquidity()
            && let Some(pool) = &parties.pool
        {
            match self
                .reader
                .remove_liquidity_amounts(pool.address, user.address, self.block())
                .await
            {
                Ok((options, tokens)) => position.update_remaining(options, tokens),
                Err(err) => tracing::info!(
                    pool = %pool.address,
                    user = %user.address,
                    %err,
                    "remaining liquidity unavailable"
                ),
            }
        }

        self.batch.upsert(position);
    }

    fn update_activity(&mut self, action: &Action, option: &OptionSeries, reference: U256) {
        for span in BucketSpan::ALL {
            let index = ids::bucket_index(action.timestamp, span);
            let mut bucket = self
                .batch
                .load::<OptionActivity>(&ids::activity_id(&option.id, span, index))
                .unwrap_or_else(|| OptionActivity::open(&option.id, span, action.timestamp));
            bucket.apply(action, reference);
            self.batch.upsert(bucket);
        }
    }
}
