//! Node-less testing environment and test utilities.
//!
//! [`MockReader`] is a scriptable [`ContractReader`], every read that was not
//! scripted reverts. Clones share their scripts, so a reader handed over to
//! the indexer can still be adjusted by the test.
//!
//! [`TestProtocol`] holds a fixed protocol deployment, scripts the reads its
//! contracts answer and builds their events, while [`TestTx`] attaches
//! transaction context to them.
//!

use std::{hash::Hash, sync::Arc};

use alloy::{
    primitives::{Address, B256, Log, TxHash, U256, address},
    sol_types::SolEvent,
};
use dashmap::DashMap;

use crate::{
    Deployment,
    abi::{
        factory::{
            OptionAMMFactory::{self, OptionAMMFactoryEvents},
            OptionFactory::{self, OptionFactoryEvents},
        },
        helper::OptionHelper::{self, OptionHelperEvents},
        manager::ConfigurationManager::{self, ConfigurationManagerEvents},
        option::PodOption::{self, PodOptionEvents},
        pool::{
            FeePool::{self, FeePoolEvents},
            OptionAMMPool::{self, OptionAMMPoolEvents},
        },
    },
    error::{CallError, CallResult},
    ids, num,
    reader::{ContractReader, DepositSnapshot},
    state::{
        Applied, ExerciseType, FeeSide, Indexer, IndexerOptions, OptionSeries, OptionType, ProtocolEvents,
    },
    store::MemoryStore,
    stream::RawEvent,
    types::{EventContext, StateInstant},
    watch::Watchlist,
};

const CHAIN_ID: u64 = 1337;
const GENESIS_TIMESTAMP: u64 = 1_700_000_000;
const BLOCK_TIME_SEC: u64 = 12;

pub const UNDERLYING_DECIMALS: u8 = 18;
pub const STRIKE_DECIMALS: u8 = 6;
pub const EXPIRATION: u64 = GENESIS_TIMESTAMP + 30 * 86_400;
pub const EXERCISE_WINDOW: u64 = 86_400;

pub const MANAGER: Address = address!("0x00000000000000000000000000000000000c0f19");
pub const OWNER: Address = address!("0x00000000000000000000000000000000000000ee");
pub const OPTION_FACTORY: Address = address!("0x00000000000000000000000000000000000000f1");
pub const OPTION_HELPER: Address = address!("0x00000000000000000000000000000000000000f2");
pub const POOL_FACTORY: Address = address!("0x00000000000000000000000000000000000000f3");
pub const UNDERLYING: Address = address!("0x0000000000000000000000000000000000000e7e");
pub const STRIKE: Address = address!("0x0000000000000000000000000000000000000d5c");

pub type TestIndexer = Indexer<MemoryStore, MockReader, Watchlist>;

/// Instant of the given test block.
pub fn instant(block: u64) -> StateInstant {
    StateInstant::new(block, GENESIS_TIMESTAMP + block * BLOCK_TIME_SEC)
}

pub fn scale(amount: u64, decimals: u8) -> U256 {
    U256::from(amount) * num::pow10(decimals)
}

/// Amount of options with the underlying precision.
pub fn options(amount: u64) -> U256 {
    scale(amount, UNDERLYING_DECIMALS)
}

/// Amount of stable tokens with the strike precision.
pub fn usd(amount: u64) -> U256 {
    scale(amount, STRIKE_DECIMALS)
}

/// Put series on the underlying/strike pair at a strike of 100, unregistered.
pub fn put_option_series() -> OptionSeries {
    let address = address!("0x0000000000000000000000000000000000000a01");
    OptionSeries {
        id: ids::address_id(address),
        address,
        from: OWNER,
        r#type: OptionType::Put,
        exercise_type: ExerciseType::European,
        underlying_asset: UNDERLYING,
        underlying_asset_decimals: UNDERLYING_DECIMALS,
        underlying_asset_symbol: "WETH".to_string(),
        strike_asset: STRIKE,
        strike_asset_decimals: STRIKE_DECIMALS,
        strike_asset_symbol: "USDC".to_string(),
        collateral_asset: STRIKE,
        collateral_asset_decimals: STRIKE_DECIMALS,
        collateral_asset_symbol: "USDC".to_string(),
        strike_price: usd(100),
        expiration: EXPIRATION,
        exercise_window_size: EXERCISE_WINDOW,
        exercise_start: EXPIRATION - EXERCISE_WINDOW,
        decimals: UNDERLYING_DECIMALS,
        symbol: "PodPut WETH:USDC".to_string(),
        factory: ids::address_id(OPTION_FACTORY),
        pool: None,
        series_fee_volume: U256::ZERO,
    }
}

/// Scriptable [`ContractReader`].
#[derive(Clone, Debug, Default)]
pub struct MockReader {
    symbols: Arc<DashMap<Address, String>>,
    decimals: Arc<DashMap<Address, u8>>,
    balances: Arc<DashMap<(Address, Address), U256>>,
    asset_decimals: Arc<DashMap<Address, (u8, u8)>>,
    pool_tokens: Arc<DashMap<(Address, FeeSide), Address>>,
    fee_pools: Arc<DashMap<(Address, FeeSide), Address>>,
    sigmas: Arc<DashMap<Address, U256>>,
    buying_prices: Arc<DashMap<(Address, U256), U256>>,
    selling_prices: Arc<DashMap<(Address, U256), U256>>,
    ab_prices: Arc<DashMap<Address, U256>>,
    deamortized: Arc<DashMap<(Address, FeeSide), U256>>,
    liquidity: Arc<DashMap<(Address, Address), (U256, U256)>>,
    deposits: Arc<DashMap<(Address, Address), DepositSnapshot>>,
    calls: Arc<DashMap<&'static str, usize>>,
}

impl MockReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_token(&self, token: Address, symbol: &str, decimals: u8) {
        self.symbols.insert(token, symbol.to_string());
        self.decimals.insert(token, decimals);
    }

    pub fn set_balance(&self, token: Address, owner: Address, amount: U256) {
        self.balances.insert((token, owner), amount);
    }

    pub fn set_asset_decimals(&self, option: Address, underlying: u8, strike: u8) {
        self.asset_decimals.insert(option, (underlying, strike));
    }

    pub fn set_pool_token(&self, pool: Address, side: FeeSide, token: Address) {
        self.pool_tokens.insert((pool, side), token);
    }

    pub fn set_fee_pool(&self, pool: Address, side: FeeSide, fee_pool: Address) {
        self.fee_pools.insert((pool, side), fee_pool);
    }

    pub fn set_sigma(&self, pool: Address, sigma: U256) {
        self.sigmas.insert(pool, sigma);
    }

    pub fn set_buying_price(&self, pool: Address, amount: U256, price: U256) {
        self.buying_prices.insert((pool, amount), price);
    }

    pub fn set_selling_price(&self, pool: Address, amount: U256, price: U256) {
        self.selling_prices.insert((pool, amount), price);
    }

    pub fn set_ab_price(&self, pool: Address, price: U256) {
        self.ab_prices.insert(pool, price);
    }

    pub fn set_deamortized_balance(&self, pool: Address, side: FeeSide, balance: U256) {
        self.deamortized.insert((pool, side), balance);
    }

    pub fn set_remove_liquidity_amounts(&self, pool: Address, user: Address, amounts: (U256, U256)) {
        self.liquidity.insert((pool, user), amounts);
    }

    pub fn set_deposit_snapshot(&self, pool: Address, user: Address, snapshot: DepositSnapshot) {
        self.deposits.insert((pool, user), snapshot);
    }

    /// Number of reads of the given call, scripted or not.
    pub fn calls(&self, call: &str) -> usize {
        self.calls.get(call).map_or(0, |c| *c)
    }

    fn read<K: Eq + Hash, V: Clone>(
        &self,
        call: &'static str,
        map: &DashMap<K, V>,
        key: &K,
    ) -> CallResult<V> {
        *self.calls.entry(call).or_default() += 1;
        map.get(key)
            .map(|v| v.value().clone())
            .ok_or_else(|| CallError::Reverted(format!("{call} is not scripted")))
    }
}

impl ContractReader for MockReader {
    async fn token_symbol(&self, token: Address, _block: u64) -> CallResult<String> {
        self.read("symbol", &self.symbols, &token)
    }

    async fn token_decimals(&self, token: Address, _block: u64) -> CallResult<u8> {
        self.read("decimals", &self.decimals, &token)
    }

    async fn balance_of(&self, token: Address, owner: Address, _block: u64) -> CallResult<U256> {
        self.read("balanceOf", &self.balances, &(token, owner))
    }

    async fn underlying_asset_decimals(&self, option: Address, _block: u64) -> CallResult<u8> {
        self.read("underlyingAssetDecimals", &self.asset_decimals, &option)
            .map(|(underlying, _)| underlying)
    }

    async fn strike_asset_decimals(&self, option: Address, _block: u64) -> CallResult<u8> {
        self.read("strikeAssetDecimals", &self.asset_decimals, &option)
            .map(|(_, strike)| strike)
    }

    async fn pool_token(&self, pool: Address, side: FeeSide, _block: u64) -> CallResult<Address> {
        self.read("poolToken", &self.pool_tokens, &(pool, side))
    }

    async fn pool_token_decimals(
        &self,
        pool: Address,
        side: FeeSide,
        _block: u64,
    ) -> CallResult<u8> {
        let token = self.read("poolTokenDecimals", &self.pool_tokens, &(pool, side))?;
        self.read("decimals", &self.decimals, &token)
    }

    async fn fee_pool(&self, pool: Address, side: FeeSide, _block: u64) -> CallResult<Address> {
        self.read("feePool", &self.fee_pools, &(pool, side))
    }

    async fn current_sigma(&self, pool: Address, _block: u64) -> CallResult<U256> {
        self.read("priceProperties", &self.sigmas, &pool)
    }

    async fn buying_price(&self, pool: Address, amount: U256, _block: u64) -> CallResult<U256> {
        self.read(
            "getOptionTradeDetailsExactAOutput",
            &self.buying_prices,
            &(pool, amount),
        )
    }

    async fn selling_price(&self, pool: Address, amount: U256, _block: u64) -> CallResult<U256> {
        self.read(
            "getOptionTradeDetailsExactAInput",
            &self.selling_prices,
            &(pool, amount),
        )
    }

    async fn ab_price(&self, pool: Address, _block: u64) -> CallResult<U256> {
        self.read("getABPrice", &self.ab_prices, &pool)
    }

    async fn deamortized_balance(
        &self,
        pool: Address,
        side: FeeSide,
        _block: u64,
    ) -> CallResult<U256> {
        self.read("deamortizedBalance", &self.deamortized, &(pool, side))
    }

    async fn remove_liquidity_amounts(
        &self,
        pool: Address,
        user: Address,
        _block: u64,
    ) -> CallResult<(U256, U256)> {
        self.read("getRemoveLiquidityAmounts", &self.liquidity, &(pool, user))
    }

    async fn user_deposit_snapshot(
        &self,
        pool: Address,
        user: Address,
        _block: u64,
    ) -> CallResult<DepositSnapshot> {
        self.read("getUserDepositSnapshot", &self.deposits, &(pool, user))
    }
}

/// Transaction emitting test events, numbering their logs in order.
#[derive(Clone, Debug)]
pub struct TestTx {
    pub hash: TxHash,
    pub from: Address,
    pub index: u64,
    next_log_index: u64,
}

impl TestTx {
    pub fn new(seq: u64, from: Address) -> Self {
        Self {
            hash: B256::left_padding_from(&seq.to_be_bytes()),
            from,
            index: seq % 100,
            next_log_index: 0,
        }
    }

    pub fn id(&self) -> String {
        ids::tx_id(self.hash)
    }

    /// Decoded event emitted by the given contract, as the next log of the transaction.
    pub fn event(&mut self, emitter: Address, event: ProtocolEvents) -> EventContext<ProtocolEvents> {
        let log_index = self.next_log();
        EventContext::new(self.hash, self.from, self.index, log_index, emitter, event)
    }

    /// Raw log of the event emitted by the given contract, as the next log of the transaction.
    pub fn raw<E: SolEvent>(&mut self, emitter: Address, event: &E) -> RawEvent {
        let log_index = self.next_log();
        let log = Log {
            address: emitter,
            data: event.encode_log_data(),
        };
        EventContext::new(self.hash, self.from, self.index, log_index, emitter, log)
    }

    fn next_log(&mut self) -> u64 {
        let log_index = self.next_log_index;
        self.next_log_index += 1;
        log_index
    }
}

/// Listed option series along with its pool.
#[derive(Clone, Copy, Debug)]
pub struct TestSeries {
    pub option: Address,
    pub r#type: OptionType,
    pub pool: Address,
    pub fee_pool_a: Address,
    pub fee_pool_b: Address,
}

/// Protocol deployment at fixed addresses with scripted reads.
#[derive(Debug)]
pub struct TestProtocol {
    pub deployment: Deployment,
    pub reader: MockReader,
    next_tx: u64,
    next_block: u64,
}

impl Default for TestProtocol {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProtocol {
    pub fn new() -> Self {
        let reader = MockReader::new();
        reader.set_token(UNDERLYING, "WETH", UNDERLYING_DECIMALS);
        reader.set_token(STRIKE, "USDC", STRIKE_DECIMALS);
        Self {
            deployment: Deployment::custom(CHAIN_ID, MANAGER, 0),
            reader,
            next_tx: 1,
            next_block: 1,
        }
    }

    /// Indexer following the configuration manager only, with nothing indexed.
    pub fn indexer(&self, options: IndexerOptions) -> TestIndexer {
        Indexer::new(
            MemoryStore::new(),
            self.reader.clone(),
            Watchlist::new(MANAGER),
            options,
            instant(0),
        )
    }

    /// Next transaction, sent by the given address.
    pub fn tx(&mut self, from: Address) -> TestTx {
        let tx = TestTx::new(self.next_tx, from);
        self.next_tx += 1;
        tx
    }

    /// Instant of the next block.
    pub fn block(&mut self) -> StateInstant {
        let block = self.next_block;
        self.next_block += 1;
        instant(block)
    }

    pub fn module_set(name: B256, address: Address) -> ProtocolEvents {
        ProtocolEvents::Manager(ConfigurationManagerEvents::ModuleSet(
            ConfigurationManager::ModuleSet {
                name,
                newAddress: address,
            },
        ))
    }

    pub fn ownership_transferred(previous: Address, owner: Address) -> ProtocolEvents {
        ProtocolEvents::Manager(ConfigurationManagerEvents::OwnershipTransferred(
            ConfigurationManager::OwnershipTransferred {
                previousOwner: previous,
                newOwner: owner,
            },
        ))
    }

    /// Announces the three modules, one transaction each.
    pub async fn install_modules(&mut self, indexer: &mut TestIndexer) {
        for (name, address) in [
            (ids::MODULE_OPTION_FACTORY, OPTION_FACTORY),
            (ids::MODULE_OPTION_HELPER, OPTION_HELPER),
            (ids::MODULE_AMM_FACTORY, POOL_FACTORY),
        ] {
            self.send(indexer, OWNER, vec![(MANAGER, Self::module_set(name, address))])
                .await;
        }
    }

    /// Applies the events as consecutive logs of one transaction in the next block.
    pub async fn send(
        &mut self,
        indexer: &mut TestIndexer,
        from: Address,
        events: Vec<(Address, ProtocolEvents)>,
    ) -> (TestTx, Vec<Applied>) {
        let (instant, mut tx) = (self.block(), self.tx(from));
        let mut applied = Vec::with_capacity(events.len());
        for (emitter, event) in events {
            let event = tx.event(emitter, event);
            applied.push(indexer.apply_event(instant, &event).await.unwrap());
        }
        (tx, applied)
    }

    /// Scripts the reads of an option series at a strike of 100 and returns its creation event.
    pub fn option_created(&self, option: Address, r#type: OptionType) -> ProtocolEvents {
        self.reader
            .set_asset_decimals(option, UNDERLYING_DECIMALS, STRIKE_DECIMALS);
        let symbol = match r#type {
            OptionType::Put => "PodPut WETH:USDC",
            OptionType::Call => "PodCall WETH:USDC",
        };
        self.reader.set_token(option, symbol, UNDERLYING_DECIMALS);
        ProtocolEvents::OptionFactory(OptionFactoryEvents::OptionCreated(
            OptionFactory::OptionCreated {
                deployer: OWNER,
                option,
                optionType: r#type as u8,
                exerciseType: ExerciseType::European as u8,
                underlyingAsset: UNDERLYING,
                strikeAsset: STRIKE,
                strikePrice: usd(100),
                expiration: U256::from(EXPIRATION),
                exerciseWindowSize: U256::from(EXERCISE_WINDOW),
            },
        ))
    }

    /// Scripts the reads of a pool of the option against the strike token
    /// and returns its creation event.
    pub fn pool_created(&self, series: &TestSeries) -> ProtocolEvents {
        let (pool, reader) = (series.pool, &self.reader);
        reader.set_pool_token(pool, FeeSide::A, series.option);
        reader.set_pool_token(pool, FeeSide::B, STRIKE);
        reader.set_fee_pool(pool, FeeSide::A, series.fee_pool_a);
        reader.set_fee_pool(pool, FeeSide::B, series.fee_pool_b);
        ProtocolEvents::PoolFactory(OptionAMMFactoryEvents::PoolCreated(
            OptionAMMFactory::PoolCreated {
                deployer: OWNER,
                pool,
                option: series.option,
            },
        ))
    }

    /// Registers an option series and its pool, one transaction each.
    ///
    /// Addresses are derived from the given seed.
    pub async fn list_series(
        &mut self,
        indexer: &mut TestIndexer,
        seed: u8,
        r#type: OptionType,
    ) -> TestSeries {
        let series = TestSeries {
            option: Address::with_last_byte(seed),
            r#type,
            pool: Address::left_padding_from(&[0x0b, seed]),
            fee_pool_a: Address::left_padding_from(&[0x0f, 0xa0, seed]),
            fee_pool_b: Address::left_padding_from(&[0x0f, 0xb0, seed]),
        };

        let event = self.option_created(series.option, r#type);
        self.send(indexer, OWNER, vec![(OPTION_FACTORY, event)]).await;
        let event = self.pool_created(&series);
        self.send(indexer, OWNER, vec![(POOL_FACTORY, event)]).await;

        series
    }

    pub fn bought(buyer: Address, option: Address, amount: U256, premium: U256) -> ProtocolEvents {
        ProtocolEvents::Helper(OptionHelperEvents::OptionsBought(OptionHelper::OptionsBought {
            buyer,
            optionAddress: option,
            optionsBought: amount,
            inputToken: STRIKE,
            inputSold: premium,
        }))
    }

    pub fn sold(seller: Address, option: Address, amount: U256, premium: U256) -> ProtocolEvents {
        ProtocolEvents::Helper(OptionHelperEvents::OptionsSold(OptionHelper::OptionsSold {
            seller,
            optionAddress: option,
            optionsSold: amount,
            outputToken: STRIKE,
            outputReceived: premium,
        }))
    }

    pub fn minted_and_sold(
        seller: Address,
        option: Address,
        amount: U256,
        premium: U256,
    ) -> ProtocolEvents {
        ProtocolEvents::Helper(OptionHelperEvents::OptionsMintedAndSold(
            OptionHelper::OptionsMintedAndSold {
                seller,
                optionAddress: option,
                optionsMintedAndSold: amount,
                outputToken: STRIKE,
                outputBought: premium,
            },
        ))
    }

    pub fn mint(minter: Address, amount: U256) -> ProtocolEvents {
        ProtocolEvents::Option(PodOptionEvents::Mint(PodOption::Mint { minter, amount }))
    }

    pub fn unmint(minter: Address, amount: U256, strike_amount: U256) -> ProtocolEvents {
        ProtocolEvents::Option(PodOptionEvents::Unmint(PodOption::Unmint {
            minter,
            optionAmount: amount,
            strikeAmount: strike_amount,
            underlyingAmount: U256::ZERO,
        }))
    }

    pub fn exercise(exerciser: Address, amount: U256) -> ProtocolEvents {
        ProtocolEvents::Option(PodOptionEvents::Exercise(PodOption::Exercise {
            exerciser,
            amount,
        }))
    }

    pub fn withdraw(minter: Address, strike_amount: U256, underlying_amount: U256) -> ProtocolEvents {
        ProtocolEvents::Option(PodOptionEvents::Withdraw(PodOption::Withdraw {
            minter,
            strikeAmount: strike_amount,
            underlyingAmount: underlying_amount,
        }))
    }

    pub fn transfer(from: Address, to: Address, value: U256) -> ProtocolEvents {
        ProtocolEvents::Option(PodOptionEvents::Transfer(PodOption::Transfer { from, to, value }))
    }

    pub fn add_liquidity(owner: Address, amount_a: U256, amount_b: U256) -> ProtocolEvents {
        ProtocolEvents::Pool(OptionAMMPoolEvents::AddLiquidity(OptionAMMPool::AddLiquidity {
            caller: owner,
            owner,
            amountA: amount_a,
            amountB: amount_b,
        }))
    }

    pub fn remove_liquidity(caller: Address, amount_a: U256, amount_b: U256) -> ProtocolEvents {
        ProtocolEvents::Pool(OptionAMMPoolEvents::RemoveLiquidity(
            OptionAMMPool::RemoveLiquidity {
                caller,
                amountA: amount_a,
                amountB: amount_b,
            },
        ))
    }

    pub fn trade_info(spot_price: U256, iv: U256) -> ProtocolEvents {
        ProtocolEvents::Pool(OptionAMMPoolEvents::TradeInfo(OptionAMMPool::TradeInfo {
            spotPrice: spot_price,
            newIV: iv,
        }))
    }

    pub fn fee_withdrawn(to: Address, amount: U256) -> ProtocolEvents {
        ProtocolEvents::FeePool(FeePoolEvents::FeeWithdrawn(FeePool::FeeWithdrawn {
            token: STRIKE,
            to,
            feeWithdrawn: amount,
            share: U256::ZERO,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::CallResultExt;

    #[tokio::test]
    async fn test_unscripted_reads_revert() {
        let reader = MockReader::new();
        let token = Address::with_last_byte(1);
        assert!(matches!(
            reader.token_decimals(token, 0).await,
            Err(CallError::Reverted(_))
        ));
        assert_eq!(reader.balance_of(token, token, 0).await.or_zero("balanceOf", token), U256::ZERO);

        let shared = reader.clone();
        shared.set_token(token, "TKN", 8);
        assert_eq!(reader.token_decimals(token, 0).await, Ok(8));
        assert_eq!(reader.calls("decimals"), 2);
    }

    #[test]
    fn test_tx_numbers_logs() {
        let mut tx = TestTx::new(7, OWNER);
        let first = tx.event(MANAGER, TestProtocol::ownership_transferred(Address::ZERO, OWNER));
        let second = tx.raw(
            MANAGER,
            &ConfigurationManager::OwnershipTransferred {
                previousOwner: OWNER,
                newOwner: Address::ZERO,
            },
        );
        assert_eq!(first.log_index(), 0);
        assert_eq!(second.log_index(), 1);
        assert_eq!(first.tx_hash(), second.tx_hash());
        assert_eq!(first.tx_id(), tx.id());
    }
}
