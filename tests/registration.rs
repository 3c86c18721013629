use alloy::primitives::Address;
use options_indexer::{
    ids,
    state::{
        Applied, FeePool, FeeSide, IndexerOptions, OptionSeries, OptionType, Pool, SkipReason,
    },
    store::StoreExt,
    testing::{
        self, EXERCISE_WINDOW, EXPIRATION, OPTION_FACTORY, OWNER, POOL_FACTORY, STRIKE,
        TestProtocol, TestSeries, UNDERLYING,
    },
    watch::{Subscriptions, WatchKind},
};

fn series(seed: u8, r#type: OptionType) -> TestSeries {
    TestSeries {
        option: Address::with_last_byte(seed),
        r#type,
        pool: Address::left_padding_from(&[0x0b, seed]),
        fee_pool_a: Address::left_padding_from(&[0x0f, 0xa0, seed]),
        fee_pool_b: Address::left_padding_from(&[0x0f, 0xb0, seed]),
    }
}

#[tokio::test]
async fn test_option_collateral_by_type() {
    let mut protocol = TestProtocol::new();
    let mut indexer = protocol.indexer(IndexerOptions::default());
    protocol.install_modules(&mut indexer).await;
    let put = protocol.list_series(&mut indexer, 1, OptionType::Put).await;
    let call = protocol.list_series(&mut indexer, 2, OptionType::Call).await;

    let put = indexer
        .store()
        .load::<OptionSeries>(&ids::address_id(put.option))
        .unwrap();
    assert_eq!(put.collateral_asset, STRIKE);
    assert_eq!(put.collateral_asset_decimals, testing::STRIKE_DECIMALS);
    assert_eq!(put.collateral_asset_symbol, "USDC");
    assert_eq!(put.strike_price, testing::usd(100));
    assert_eq!(put.exercise_start, EXPIRATION - EXERCISE_WINDOW);
    assert_eq!(put.factory, ids::address_id(OPTION_FACTORY));
    assert_eq!(put.symbol, "PodPut WETH:USDC");
    assert_eq!(put.decimals, testing::UNDERLYING_DECIMALS);

    let call = indexer
        .store()
        .load::<OptionSeries>(&ids::address_id(call.option))
        .unwrap();
    assert_eq!(call.collateral_asset, UNDERLYING);
    assert_eq!(call.collateral_asset_decimals, testing::UNDERLYING_DECIMALS);
    assert_eq!(call.collateral_asset_symbol, "WETH");
}

#[tokio::test]
async fn test_pool_wiring() {
    let mut protocol = TestProtocol::new();
    let mut indexer = protocol.indexer(IndexerOptions::default());
    protocol.install_modules(&mut indexer).await;
    let listed = protocol.list_series(&mut indexer, 1, OptionType::Put).await;

    let store = indexer.store();
    let option = store
        .load::<OptionSeries>(&ids::address_id(listed.option))
        .unwrap();
    let pool = store.load::<Pool>(&ids::address_id(listed.pool)).unwrap();
    assert_eq!(option.pool, Some(pool.id.clone()));
    assert_eq!(pool.option, option.id);
    assert_eq!(pool.factory, ids::address_id(POOL_FACTORY));
    assert_eq!(pool.token_a, listed.option);
    assert_eq!(pool.token_a_decimals, testing::UNDERLYING_DECIMALS);
    assert_eq!(pool.token_b, STRIKE);
    assert_eq!(pool.token_b_symbol, "USDC");

    for (side, address) in [(FeeSide::A, listed.fee_pool_a), (FeeSide::B, listed.fee_pool_b)] {
        let fee_pool = store.load::<FeePool>(&ids::address_id(address)).unwrap();
        assert_eq!(fee_pool.r#type, side);
        assert_eq!(fee_pool.pool, pool.id);
        assert_eq!(pool.fee_pool(side), Some(fee_pool.id.as_str()));
        assert_eq!(
            indexer.watches().watch_kind(address),
            Some(WatchKind::FeePool)
        );
    }
    assert_eq!(
        indexer.watches().watch_kind(listed.pool),
        Some(WatchKind::Pool)
    );
}

#[tokio::test]
async fn test_unwired_fee_pool_left_empty() {
    let mut protocol = TestProtocol::new();
    let mut indexer = protocol.indexer(IndexerOptions::default());
    protocol.install_modules(&mut indexer).await;
    let listed = TestSeries {
        fee_pool_a: Address::ZERO,
        ..series(3, OptionType::Put)
    };
    let event = protocol.option_created(listed.option, listed.r#type);
    protocol
        .send(&mut indexer, OWNER, vec![(OPTION_FACTORY, event)])
        .await;
    let event = protocol.pool_created(&listed);
    protocol
        .send(&mut indexer, OWNER, vec![(POOL_FACTORY, event)])
        .await;

    let pool = indexer
        .store()
        .load::<Pool>(&ids::address_id(listed.pool))
        .unwrap();
    assert_eq!(pool.fee_pool_a, None);
    assert!(pool.fee_pool_b.is_some());
    assert_eq!(indexer.store().count::<FeePool>(), 1);
}

#[tokio::test]
async fn test_creation_is_idempotent() {
    let mut protocol = TestProtocol::new();
    let mut indexer = protocol.indexer(IndexerOptions::default());
    protocol.install_modules(&mut indexer).await;
    let listed = protocol.list_series(&mut indexer, 1, OptionType::Put).await;
    let before = indexer.store().clone();

    let option_created = protocol.option_created(listed.option, listed.r#type);
    let pool_created = protocol.pool_created(&listed);
    let (_, applied) = protocol
        .send(
            &mut indexer,
            OWNER,
            vec![(OPTION_FACTORY, option_created), (POOL_FACTORY, pool_created)],
        )
        .await;

    assert_eq!(
        applied,
        vec![
            Applied::Skipped(SkipReason::Duplicate),
            Applied::Skipped(SkipReason::Duplicate)
        ]
    );
    assert_eq!(indexer.store(), &before);
}

#[tokio::test]
async fn test_pool_of_unknown_option_dropped() {
    let mut protocol = TestProtocol::new();
    let mut indexer = protocol.indexer(IndexerOptions::default());
    protocol.install_modules(&mut indexer).await;
    let before = indexer.store().clone();

    let event = protocol.pool_created(&series(4, OptionType::Call));
    let (_, applied) = protocol
        .send(&mut indexer, OWNER, vec![(POOL_FACTORY, event)])
        .await;
    assert_eq!(applied, vec![Applied::Skipped(SkipReason::MissingDependency)]);
    assert_eq!(indexer.store(), &before);
}

#[tokio::test]
async fn test_option_without_decimals_dropped() {
    let mut protocol = TestProtocol::new();
    let mut indexer = protocol.indexer(IndexerOptions::default());
    protocol.install_modules(&mut indexer).await;
    let before = indexer.store().clone();

    // Creation event for an option whose reads were never scripted
    let fresh = TestProtocol::new();
    let option = Address::with_last_byte(5);
    let event = fresh.option_created(option, OptionType::Put);
    let (_, applied) = protocol
        .send(&mut indexer, OWNER, vec![(OPTION_FACTORY, event)])
        .await;

    assert_eq!(applied, vec![Applied::Skipped(SkipReason::MissingDependency)]);
    assert_eq!(indexer.store(), &before);
    assert_eq!(indexer.watches().watch_kind(option), None);
}
