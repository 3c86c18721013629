//! Live market state stamped onto actions.

use alloy::primitives::{Address, U256};

use super::{
    Action, FeePool, FeeSide, LiveSnapshot, OptionSeries, Pool, User, indexer::Reduction,
};
use crate::{
    error::CallResult,
    num,
    reader::{CallResultExt, ContractReader, DepositSnapshot},
    store::{Store, StoreExt},
};

impl<S: Store, R: ContractReader> Reduction<'_, S, R> {
    /// Snapshots pool, token and user state right after the action and
    /// ratchets the series fee volume of the option.
    ///
    /// Every read is independent and degrades to zero on failure.
    pub(super) async fn track(
        &mut self,
        action: &mut Action,
        user: &User,
        option: &OptionSeries,
        pool: &Pool,
        reference: U256,
    ) {
        let (block, reader) = (self.block(), self.reader);
        let (fee_pool_a, fee_pool_b) = (
            self.fee_pool_address(pool, FeeSide::A),
            self.fee_pool_address(pool, FeeSide::B),
        );
        let unit = num::pow10(pool.token_a_decimals);

        let (
            sigma,
            buying_price,
            selling_price,
            dynamic_buying_price,
            dynamic_selling_price,
            user_liquidity,
            tba,
            tbb,
            dba,
            dbb,
            fees_a,
            fees_b,
            collateral_tvl,
            deposit,
            ab_price,
        ) = futures::join!(
            reader.current_sigma(pool.address, block),
            reader.buying_price(pool.address, unit, block),
            reader.selling_price(pool.address, unit, block),
            async {
                if reference.is_zero() {
                    return Ok(U256::ZERO);
                }
                reader.buying_price(pool.address, reference, block).await
            },
            async {
                if reference.is_zero() {
                    return Ok(U256::ZERO);
                }
                reader.selling_price(pool.address, reference, block).await
            },
            reader.remove_liquidity_amounts(pool.address, user.address, block),
            reader.balance_of(pool.token_a, pool.address, block),
            reader.balance_of(pool.token_b, pool.address, block),
            reader.deamortized_balance(pool.address, FeeSide::A, block),
            reader.deamortized_balance(pool.address, FeeSide::B, block),
            fee_balance(reader, pool.token_b, fee_pool_a, block),
            fee_balance(reader, pool.token_b, fee_pool_b, block),
            reader.balance_of(pool.token_b, option.address, block),
            reader.user_deposit_snapshot(pool.address, user.address, block),
            reader.ab_price(pool.address, block),
        );

        let (user_token_a_liquidity, user_token_b_liquidity) =
            user_liquidity.or_zero("getRemoveLiquidityAmounts", pool.address);
        let deposit: DepositSnapshot = deposit.or_zero("getUserDepositSnapshot", pool.address);
        let next_tba = tba.or_zero("balanceOf", pool.token_a);
        let next_tbb = tbb.or_zero("balanceOf", pool.token_b);
        let next_fees_a = fees_a.or_zero("balanceOf", pool.token_b);
        let next_fees_b = fees_b.or_zero("balanceOf", pool.token_b);

        action.live = Some(LiveSnapshot {
            next_iv: sigma.or_zero("priceProperties", pool.address),
            next_buying_price: buying_price.or_zero("getOptionTradeDetailsExactAOutput", pool.address),
            next_selling_price: selling_price
                .or_zero("getOptionTradeDetailsExactAInput", pool.address),
            next_dynamic_buying_price: dynamic_buying_price
                .or_zero("getOptionTradeDetailsExactAOutput", pool.address),
            next_dynamic_selling_price: dynamic_selling_price
                .or_zero("getOptionTradeDetailsExactAInput", pool.address),
            next_user_token_a_liquidity: user_token_a_liquidity,
            next_user_token_b_liquidity: user_token_b_liquidity,
            next_tba,
            next_tbb,
            next_dba: dba.or_zero("deamortizedTokenABalance", pool.address),
            next_dbb: dbb.or_zero("deamortizedTokenBBalance", pool.address),
            next_fees_a,
            next_fees_b,
            next_collateral_tvl: collateral_tvl.or_zero("balanceOf", pool.token_b),
            next_pool_token_a_tvl: next_tba,
            next_pool_token_b_tvl: next_tbb,
            next_user_token_a_original_balance: deposit.token_a_balance,
            next_user_token_b_original_balance: deposit.token_b_balance,
            next_user_snapshot_fimp: deposit.fimp_opening,
            next_ab_price: ab_price.or_zero("getABPrice", pool.address),
        });

        // Reloaded, the batch may hold a fresher copy than the caller
        if let Some(mut option) = self.batch.load::<OptionSeries>(&option.id)
            && option.ratchet_fee_volume(next_fees_a.saturating_add(next_fees_b))
        {
            tracing::debug!(
                option = %option.address,
                volume = %option.series_fee_volume,
                "series fee volume raised"
            );
            self.batch.upsert(option);
        }
    }

    fn fee_pool_address(&self, pool: &Pool, side: FeeSide) -> Option<Address> {
        let id = pool.fee_pool(side)?;
        self.batch.load::<FeePool>(id).map(|fee_pool| fee_pool.address)
    }
}

/// Stable token balance of a fee pool, zero when the pool has none wired.
async fn fee_balance<R: ContractReader>(
    reader: &R,
    token: Address,
    fee_pool: Option<Address>,
    block: u64,
) -> CallResult<U256> {
    match fee_pool {
        Some(fee_pool) => reader.balance_of(token, fee_pool, block).await,
        None => Ok(U256::ZERO),
    }
}
