//! Option and pool registration.

use super::{
    Applied, ExerciseType, FeePool, FeeSide, OptionSeries, OptionType, Pool, ProtocolEvents,
    SkipReason, indexer::Reduction,
};
use crate::{
    abi::{factory::OptionAMMFactory::PoolCreated, factory::OptionFactory::OptionCreated},
    error::IndexerError,
    ids,
    reader::{CallResultExt, ContractReader},
    store::{Store, StoreExt},
    types::EventContext,
    watch::WatchKind,
};

impl<S: Store, R: ContractReader> Reduction<'_, S, R> {
    pub(super) async fn option_created(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        event: &OptionCreated,
    ) -> Result<Applied, IndexerError> {
        let id = ids::address_id(event.option);
        if self.batch.contains::<OptionSeries>(&id) {
            tracing::debug!(option = %event.option, "option already registered");
            return Ok(Applied::Skipped(SkipReason::Duplicate));
        }
        let (Ok(r#type), Ok(exercise_type)) = (
            OptionType::try_from(event.optionType),
            ExerciseType::try_from(event.exerciseType),
        ) else {
            tracing::warn!(
                option = %event.option,
                option_type = event.optionType,
                exercise_type = event.exerciseType,
                "unknown option terms"
            );
            return Ok(Applied::Skipped(SkipReason::Undecodable));
        };

        let (block, reader) = (self.block(), self.reader);
        let (underlying_decimals, strike_decimals, decimals, symbol, underlying_symbol, strike_symbol) = futures::join!(
            reader.underlying_asset_decimals(event.option, block),
            reader.strike_asset_decimals(event.option, block),
            reader.token_decimals(event.option, block),
            reader.token_symbol(event.option, block),
            reader.token_symbol(event.underlyingAsset, block),
            reader.token_symbol(event.strikeAsset, block),
        );
        let (underlying_decimals, strike_decimals, decimals) =
            match (underlying_decimals, strike_decimals, decimals) {
                (Ok(u), Ok(s), Ok(d)) => (u, s, d),
                (u, s, d) => {
                    tracing::warn!(
                        option = %event.option,
                        underlying = ?u.err(),
                        strike = ?s.err(),
                        decimals = ?d.err(),
                        "option decimals unavailable"
                    );
                    return Ok(Applied::Skipped(SkipReason::MissingDependency));
                }
            };
        let underlying_symbol = underlying_symbol.or_zero("symbol", event.underlyingAsset);
        let strike_symbol = strike_symbol.or_zero("symbol", event.strikeAsset);
        let (collateral_asset, collateral_asset_decimals, collateral_asset_symbol) = r#type
            .collateral(
                (event.underlyingAsset, underlying_decimals, underlying_symbol.clone()),
                (event.strikeAsset, strike_decimals, strike_symbol.clone()),
            );

        let expiration = event.expiration.saturating_to::<u64>();
        let exercise_window_size = event.exerciseWindowSize.saturating_to::<u64>();
        let option = OptionSeries {
            id,
            address: event.option,
            from: event.deployer,
            r#type,
            exercise_type,
            underlying_asset: event.underlyingAsset,
            underlying_asset_decimals: underlying_decimals,
            underlying_asset_symbol: underlying_symbol,
            strike_asset: event.strikeAsset,
            strike_asset_decimals: strike_decimals,
            strike_asset_symbol: strike_symbol,
            collateral_asset,
            collateral_asset_decimals,
            collateral_asset_symbol,
            strike_price: event.strikePrice,
            expiration,
            exercise_window_size,
            exercise_start: expiration.saturating_sub(exercise_window_size),
            decimals,
            symbol: symbol.or_zero("symbol", event.option),
            factory: ids::address_id(ctx.address()),
            pool: None,
            series_fee_volume: Default::default(),
        };

        tracing::info!(
            option = %event.option,
            symbol = %option.symbol,
            option_type = ?r#type,
            strike = %option.strike_price_decimal(),
            "option registered"
        );
        self.get_or_create_manager(ctx);
        self.batch.upsert(option);
        self.watch(event.option, WatchKind::Option);
        Ok(Applied::Done)
    }

    pub(super) async fn pool_created(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        event: &PoolCreated,
    ) -> Result<Applied, IndexerError> {
        let id = ids::address_id(event.pool);
        if self.batch.contains::<Pool>(&id) {
            tracing::debug!(pool = %event.pool, "pool already registered");
            return Ok(Applied::Skipped(SkipReason::Duplicate));
        }
        let Some(mut option) = self.batch.load::<OptionSeries>(&ids::address_id(event.option))
        else {
            tracing::debug!(pool = %event.pool, option = %event.option, "pool of unknown option");
            return Ok(Applied::Skipped(SkipReason::MissingDependency));
        };

        let (block, reader) = (self.block(), self.reader);
        let (token_a, token_b, token_a_decimals, token_b_decimals, fee_pool_a, fee_pool_b) = futures::join!(
            reader.pool_token(event.pool, FeeSide::A, block),
            reader.pool_token(event.pool, FeeSide::B, block),
            reader.pool_token_decimals(event.pool, FeeSide::A, block),
            reader.pool_token_decimals(event.pool, FeeSide::B, block),
            reader.fee_pool(event.pool, FeeSide::A, block),
            reader.fee_pool(event.pool, FeeSide::B, block),
        );
        let (token_a, token_b, token_a_decimals, token_b_decimals) =
            match (token_a, token_b, token_a_decimals, token_b_decimals) {
                (Ok(a), Ok(b), Ok(a_dec), Ok(b_dec)) => (a, b, a_dec, b_dec),
                (a, b, a_dec, b_dec) => {
                    tracing::warn!(
                        pool = %event.pool,
                        token_a = ?a.err(),
                        token_b = ?b.err(),
                        token_a_decimals = ?a_dec.err(),
                        token_b_decimals = ?b_dec.err(),
                        "pool tokens unavailable"
                    );
                    return Ok(Applied::Skipped(SkipReason::MissingDependency));
                }
            };
        let (token_a_symbol, token_b_symbol) = futures::join!(
            reader.token_symbol(token_a, block),
            reader.token_symbol(token_b, block),
        );

        let mut pool = Pool {
            id,
            address: event.pool,
            from: event.deployer,
            option: option.id.clone(),
            factory: ids::address_id(ctx.address()),
            token_a,
            token_a_decimals,
            token_a_symbol: token_a_symbol.or_zero("symbol", token_a),
            token_b,
            token_b_decimals,
            token_b_symbol: token_b_symbol.or_zero("symbol", token_b),
            fee_pool_a: None,
            fee_pool_b: None,
        };

        for (side, fee_pool) in [(FeeSide::A, fee_pool_a), (FeeSide::B, fee_pool_b)] {
            let address = fee_pool.or_zero("feePool", event.pool);
            if address.is_zero() {
                tracing::debug!(pool = %event.pool, %side, "fee pool not wired");
                continue;
            }
            let fee_pool = FeePool {
                id: ids::address_id(address),
                address,
                r#type: side,
                pool: pool.id.clone(),
            };
            pool.link_fee_pool(side, fee_pool.id.clone());
            self.batch.upsert(fee_pool);
            self.watch(address, WatchKind::FeePool);
        }

        tracing::info!(pool = %event.pool, option = %event.option, "pool registered");
        option.pool = Some(pool.id.clone());
        self.batch.upsert(option);
        self.batch.upsert(pool);
        self.watch(event.pool, WatchKind::Pool);
        Ok(Applied::Done)
    }
}
