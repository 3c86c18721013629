use alloy::primitives::{Address, B256, U256, b256};
use options_indexer::{
    abi::manager::ConfigurationManager,
    error::IndexerError,
    ids,
    state::{
        Applied, Configuration, IndexerOptions, Manager, OptionFactory, OptionType, SkipReason,
    },
    store::StoreExt,
    stream::RawBlockEvents,
    testing::{self, MANAGER, OPTION_FACTORY, OWNER, TestProtocol, TestTx},
    watch::{Subscriptions, WatchKind, Watchlist},
};
use tokio_test::{assert_err, assert_ok};

fn active_configuration(indexer: &testing::TestIndexer) -> Configuration {
    let manager = indexer.store().load::<Manager>(ids::MANAGER_ID).unwrap();
    indexer
        .store()
        .load::<Configuration>(&manager.configuration)
        .unwrap()
}

#[tokio::test]
async fn test_module_chain_is_copy_forward() {
    let mut protocol = TestProtocol::new();
    let mut indexer = protocol.indexer(IndexerOptions::default());

    let (first, applied) = protocol
        .send(
            &mut indexer,
            OWNER,
            vec![(
                MANAGER,
                TestProtocol::module_set(ids::MODULE_OPTION_FACTORY, OPTION_FACTORY),
            )],
        )
        .await;
    assert_eq!(applied, vec![Applied::Done]);

    // Genesis and its successor share the transaction, so only one survives
    assert_eq!(indexer.store().count::<Configuration>(), 1);
    let genesis = active_configuration(&indexer);
    assert_eq!(genesis.id, ids::configuration_id(first.hash));
    assert_eq!(genesis.option_factory, Some(ids::address_id(OPTION_FACTORY)));
    assert_eq!(genesis.option_helper, None);
    assert_eq!(genesis.owner, Address::ZERO);
    assert!(
        indexer
            .store()
            .contains::<OptionFactory>(&ids::address_id(OPTION_FACTORY))
    );
    assert_eq!(
        indexer.watches().watch_kind(OPTION_FACTORY),
        Some(WatchKind::OptionFactory)
    );

    let new_owner = Address::with_last_byte(0x42);
    let (second, _) = protocol
        .send(
            &mut indexer,
            OWNER,
            vec![(MANAGER, TestProtocol::ownership_transferred(OWNER, new_owner))],
        )
        .await;

    assert_eq!(indexer.store().count::<Configuration>(), 2);
    let active = active_configuration(&indexer);
    assert_eq!(active.id, ids::configuration_id(second.hash));
    assert_eq!(active.owner, new_owner);
    assert_eq!(active.option_factory, genesis.option_factory);

    // Superseded configuration is never touched again
    assert_eq!(
        indexer.store().load::<Configuration>(&genesis.id),
        Some(genesis)
    );
}

#[tokio::test]
async fn test_module_announcements_skipped() {
    let mut protocol = TestProtocol::new();
    let mut indexer = protocol.indexer(IndexerOptions::default());
    protocol.install_modules(&mut indexer).await;
    assert_eq!(indexer.store().count::<Configuration>(), 3);
    let before = indexer.store().clone();

    let (_, applied) = protocol
        .send(
            &mut indexer,
            OWNER,
            vec![
                (
                    MANAGER,
                    TestProtocol::module_set(ids::MODULE_OPTION_FACTORY, OPTION_FACTORY),
                ),
                (
                    MANAGER,
                    TestProtocol::module_set(
                        b256!("0x4f5241434c450000000000000000000000000000000000000000000000000000"),
                        Address::with_last_byte(0x99),
                    ),
                ),
            ],
        )
        .await;
    assert_eq!(
        applied,
        vec![
            Applied::Skipped(SkipReason::Duplicate),
            Applied::Skipped(SkipReason::Ignored)
        ]
    );
    assert_eq!(indexer.store(), &before);
    assert_eq!(indexer.watches().watch_kind(Address::with_last_byte(0x99)), None);
}

#[tokio::test]
async fn test_parameter_set_ignored() {
    let mut protocol = TestProtocol::new();
    let mut indexer = protocol.indexer(IndexerOptions::default());
    let mut tx = protocol.tx(OWNER);
    let raw = tx.raw(
        MANAGER,
        &ConfigurationManager::ParameterSet {
            name: B256::with_last_byte(1),
            value: U256::from(10),
        },
    );

    let applied = assert_ok!(indexer.apply_raw_event(testing::instant(1), &raw).await);
    assert_eq!(applied, Applied::Skipped(SkipReason::Ignored));
    assert!(indexer.store().is_empty());
}

#[tokio::test]
async fn test_block_ordering() {
    let protocol = TestProtocol::new();
    let mut indexer = protocol.indexer(IndexerOptions::default());
    let mut tx = TestTx::new(1, OWNER);
    let module_set = ConfigurationManager::ModuleSet {
        name: ids::MODULE_OPTION_FACTORY,
        newAddress: OPTION_FACTORY,
    };
    let unwatched = Address::with_last_byte(0x77);
    let block = RawBlockEvents::new(
        testing::instant(1),
        vec![tx.raw(MANAGER, &module_set), tx.raw(unwatched, &module_set)],
    );

    let applied = assert_ok!(indexer.apply_events(&block).await).unwrap();
    assert_eq!(applied.instant(), testing::instant(1));
    let outcomes: Vec<_> = applied.events().iter().map(|e| *e.event()).collect();
    assert_eq!(
        outcomes,
        vec![Applied::Done, Applied::Skipped(SkipReason::Unwatched)]
    );
    let len = indexer.store().len();

    // Re-delivery is ignored
    assert!(assert_ok!(indexer.apply_events(&block).await).is_none());
    assert_eq!(indexer.store().len(), len);

    let gap = RawBlockEvents::new(testing::instant(3), vec![]);
    assert!(matches!(
        assert_err!(indexer.apply_events(&gap).await),
        IndexerError::BlockOutOfOrder(2, 3)
    ));
    assert_eq!(indexer.instant(), testing::instant(1));
}

#[tokio::test]
async fn test_undecodable_log_skipped() {
    let protocol = TestProtocol::new();
    let mut indexer = protocol.indexer(IndexerOptions::default());
    let mut tx = TestTx::new(1, OWNER);
    // Option event emitted by the manager does not match its schema
    let raw = tx.raw(
        MANAGER,
        &options_indexer::abi::option::PodOption::Mint {
            minter: OWNER,
            amount: U256::from(1),
        },
    );
    assert_eq!(
        indexer.apply_raw_event(testing::instant(1), &raw).await.unwrap(),
        Applied::Skipped(SkipReason::Undecodable)
    );
}

#[tokio::test]
async fn test_watchlist_rebuilt_from_store() {
    let mut protocol = TestProtocol::new();
    let mut indexer = protocol.indexer(IndexerOptions::default());
    protocol.install_modules(&mut indexer).await;
    let series = protocol.list_series(&mut indexer, 1, OptionType::Put).await;
    protocol.list_series(&mut indexer, 2, OptionType::Call).await;

    let rebuilt = Watchlist::from_store(indexer.store(), MANAGER);
    assert_eq!(&rebuilt, indexer.watches());
    // Manager, three modules, and an option, a pool and two fee pools per series
    assert_eq!(rebuilt.len(), 4 + 2 * 4);
    assert_eq!(rebuilt.watch_kind(series.fee_pool_b), Some(WatchKind::FeePool));
}
