//! Outbound read calls against protocol and token contracts.
//!
//! Every call is pinned to the block of the event being reduced and may
//! revert. Reducers never propagate a failed read, see [`CallResultExt`].

use alloy::{
    eips::BlockId,
    primitives::{Address, U256},
    providers::Provider,
};

use crate::{
    abi::{erc20::ERC20, option::PodOption, pool::OptionAMMPool},
    error::{CallError, CallResult},
    state::FeeSide,
};

/// Percentage passed to the liquidity removal preview to cover the full deposit.
const FULL_WITHDRAWAL_PERCENT: u64 = 100;

/// Deposit of a liquidity provider as recorded by the pool.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DepositSnapshot {
    pub token_a_balance: U256,
    pub token_b_balance: U256,
    pub fimp_opening: U256,
}

/// Read-only view of the on-chain state the reducers depend on.
#[allow(async_fn_in_trait)]
pub trait ContractReader {
    async fn token_symbol(&self, token: Address, block: u64) -> CallResult<String>;

    async fn token_decimals(&self, token: Address, block: u64) -> CallResult<u8>;

    async fn balance_of(&self, token: Address, owner: Address, block: u64) -> CallResult<U256>;

    async fn underlying_asset_decimals(&self, option: Address, block: u64) -> CallResult<u8>;

    async fn strike_asset_decimals(&self, option: Address, block: u64) -> CallResult<u8>;

    async fn pool_token(&self, pool: Address, side: FeeSide, block: u64) -> CallResult<Address>;

    async fn pool_token_decimals(&self, pool: Address, side: FeeSide, block: u64)
    -> CallResult<u8>;

    async fn fee_pool(&self, pool: Address, side: FeeSide, block: u64) -> CallResult<Address>;

    /// Current implied volatility of the pool pricing.
    async fn current_sigma(&self, pool: Address, block: u64) -> CallResult<U256>;

    /// Stable tokens to pay for exactly `amount` options.
    async fn buying_price(&self, pool: Address, amount: U256, block: u64) -> CallResult<U256>;

    /// Stable tokens received for exactly `amount` options.
    async fn selling_price(&self, pool: Address, amount: U256, block: u64) -> CallResult<U256>;

    async fn ab_price(&self, pool: Address, block: u64) -> CallResult<U256>;

    async fn deamortized_balance(
        &self,
        pool: Address,
        side: FeeSide,
        block: u64,
    ) -> CallResult<U256>;

    /// Amounts of both tokens the user would get by removing all of their liquidity.
    async fn remove_liquidity_amounts(
        &self,
        pool: Address,
        user: Address,
        block: u64,
    ) -> CallResult<(U256, U256)>;

    async fn user_deposit_snapshot(
        &self,
        pool: Address,
        user: Address,
        block: u64,
    ) -> CallResult<DepositSnapshot>;
}

/// Degrades a failed read into a default value, logging the failure.
pub(crate) trait CallResultExt<T> {
    fn or_zero(self, call: &'static str, target: Address) -> T;
}

impl<T: Default> CallResultExt<T> for CallResult<T> {
    fn or_zero(self, call: &'static str, target: Address) -> T {
        match self {
            Ok(value) => value,
            Err(CallError::Reverted(err)) => {
                tracing::info!(call, %target, %err, "read call reverted");
                T::default()
            }
            Err(CallError::Transport(err)) => {
                tracing::warn!(call, %target, %err, "read call failed");
                T::default()
            }
        }
    }
}

/// [`ContractReader`] issuing `eth_call`s through the given [`Provider`].
///
/// It is recommended to setup provider with
/// [`alloy::transports::layers::RetryBackoffLayer`], as transport failures
/// are not retried here.
#[derive(Clone, Debug)]
pub struct RpcReader<P> {
    provider: P,
}

impl<P: Provider + Clone> RpcReader<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    fn erc20(&self, token: Address) -> ERC20::ERC20Instance<P> {
        ERC20::new(token, self.provider.clone())
    }

    fn option(&self, option: Address) -> PodOption::PodOptionInstance<P> {
        PodOption::new(option, self.provider.clone())
    }

    fn pool(&self, pool: Address) -> OptionAMMPool::OptionAMMPoolInstance<P> {
        OptionAMMPool::new(pool, self.provider.clone())
    }
}

impl<P: Provider + Clone> ContractReader for RpcReader<P> {
    async fn token_symbol(&self, token: Address, block: u64) -> CallResult<String> {
        Ok(self
            .erc20(token)
            .symbol()
            .block(BlockId::number(block))
            .call()
            .await?)
    }

    async fn token_decimals(&self, token: Address, block: u64) -> CallResult<u8> {
        Ok(self
            .erc20(token)
            .decimals()
            .block(BlockId::number(block))
            .call()
            .await?)
    }

    async fn balance_of(&self, token: Address, owner: Address, block: u64) -> CallResult<U256> {
        Ok(self
            .erc20(token)
            .balanceOf(owner)
            .block(BlockId::number(block))
            .call()
            .await?)
    }

    async fn underlying_asset_decimals(&self, option: Address, block: u64) -> CallResult<u8> {
        Ok(self
            .option(option)
            .underlyingAssetDecimals()
            .block(BlockId::number(block))
            .call()
            .await?)
    }

    async fn strike_asset_decimals(&self, option: Address, block: u64) -> CallResult<u8> {
        Ok(self
            .option(option)
            .strikeAssetDecimals()
            .block(BlockId::number(block))
            .call()
            .await?)
    }

    async fn pool_token(&self, pool: Address, side: FeeSide, block: u64) -> CallResult<Address> {
        let instance = self.pool(pool);
        let block = BlockId::number(block);
        Ok(match side {
            FeeSide::A => instance.tokenA().block(block).call().await?,
            FeeSide::B => instance.tokenB().block(block).call().await?,
        })
    }

    async fn pool_token_decimals(
        &self,
        pool: Address,
        side: FeeSide,
        block: u64,
    ) -> CallResult<u8> {
        let instance = self.pool(pool);
        let block = BlockId::number(block);
        Ok(match side {
            FeeSide::A => instance.tokenADecimals().block(block).call().await?,
            FeeSide::B => instance.tokenBDecimals().block(block).call().await?,
        })
    }

    async fn fee_pool(&self, pool: Address, side: FeeSide, block: u64) -> CallResult<Address> {
        let instance = self.pool(pool);
        let block = BlockId::number(block);
        Ok(match side {
            FeeSide::A => instance.feePoolA().block(block).call().await?,
            FeeSide::B => instance.feePoolB().block(block).call().await?,
        })
    }

    async fn current_sigma(&self, pool: Address, block: u64) -> CallResult<U256> {
        let props = self
            .pool(pool)
            .priceProperties()
            .block(BlockId::number(block))
            .call()
            .await?;
        Ok(props.currentSigma)
    }

    async fn buying_price(&self, pool: Address, amount: U256, block: u64) -> CallResult<U256> {
        let details = self
            .pool(pool)
            .getOptionTradeDetailsExactAOutput(amount)
            .block(BlockId::number(block))
            .call()
            .await?;
        Ok(details.amountBIn)
    }

    async fn selling_price(&self, pool: Address, amount: U256, block: u64) -> CallResult<U256> {
        let details = self
            .pool(pool)
            .getOptionTradeDetailsExactAInput(amount)
            .block(BlockId::number(block))
            .call()
            .await?;
        Ok(details.amountBOut)
    }

    async fn ab_price(&self, pool: Address, block: u64) -> CallResult<U256> {
        Ok(self
            .pool(pool)
            .getABPrice()
            .block(BlockId::number(block))
            .call()
            .await?)
    }

    async fn deamortized_balance(
        &self,
        pool: Address,
        side: FeeSide,
        block: u64,
    ) -> CallResult<U256> {
        let instance = self.pool(pool);
        let block = BlockId::number(block);
        Ok(match side {
            FeeSide::A => instance.deamortizedTokenABalance().block(block).call().await?,
            FeeSide::B => instance.deamortizedTokenBBalance().block(block).call().await?,
        })
    }

    async fn remove_liquidity_amounts(
        &self,
        pool: Address,
        user: Address,
        block: u64,
    ) -> CallResult<(U256, U256)> {
        let percent = U256::from(FULL_WITHDRAWAL_PERCENT);
        let amounts = self
            .pool(pool)
            .getRemoveLiquidityAmounts(percent, percent, user)
            .block(BlockId::number(block))
            .call()
            .await?;
        Ok((amounts.withdrawAmountA, amounts.withdrawAmountB))
    }

    async fn user_deposit_snapshot(
        &self,
        pool: Address,
        user: Address,
        block: u64,
    ) -> CallResult<DepositSnapshot> {
        let snapshot = self
            .pool(pool)
            .getUserDepositSnapshot(user)
            .block(BlockId::number(block))
            .call()
            .await?;
        Ok(DepositSnapshot {
            token_a_balance: snapshot.tokenABalance,
            token_b_balance: snapshot.tokenBBalance,
            fimp_opening: snapshot.fImpOpening,
        })
    }
}
