//! Manager and configuration chain.

use alloy::primitives::Address;

use super::{
    Applied, Configuration, Manager, Module, ModuleType, OptionFactory, OptionHelper, PoolFactory,
    ProtocolEvents, SkipReason, indexer::Reduction,
};
use crate::{
    abi::manager::ConfigurationManager::{ModuleSet, OwnershipTransferred},
    error::IndexerError,
    ids,
    reader::ContractReader,
    store::{Store, StoreExt},
    types::EventContext,
    watch::WatchKind,
};

impl<S: Store, R: ContractReader> Reduction<'_, S, R> {
    /// Loads the singleton manager, creating it along with an empty
    /// configuration keyed by the current transaction on first use.
    pub(super) fn get_or_create_manager(&mut self, ctx: &EventContext<ProtocolEvents>) -> Manager {
        if let Some(manager) = self.batch.load::<Manager>(ids::MANAGER_ID) {
            return manager;
        }

        let configuration =
            Configuration::genesis(ids::configuration_id(ctx.tx_hash()), ids::MANAGER_ID.to_string());
        let manager = Manager {
            id: ids::MANAGER_ID.to_string(),
            configuration: configuration.id.clone(),
        };
        tracing::debug!(configuration = %configuration.id, "manager created");
        self.batch.upsert(configuration);
        self.batch.upsert(manager.clone());
        manager
    }

    /// Copies the active configuration forward under the current transaction.
    ///
    /// The successor is not activated, see [`Self::activate`].
    pub(super) fn create_configuration(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
    ) -> Result<(Manager, Configuration), IndexerError> {
        let manager = self.get_or_create_manager(ctx);
        let current = self
            .batch
            .load::<Configuration>(&manager.configuration)
            .ok_or_else(|| IndexerError::ConfigurationNotFound(manager.configuration.clone()))?;
        Ok((manager, current.successor(ids::configuration_id(ctx.tx_hash()))))
    }

    /// Saves the configuration and points the manager to it.
    fn activate(&mut self, mut manager: Manager, configuration: Configuration) {
        manager.configuration = configuration.id.clone();
        self.batch.upsert(configuration);
        self.batch.upsert(manager);
    }

    pub(super) fn ownership_transferred(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        event: &OwnershipTransferred,
    ) -> Result<Applied, IndexerError> {
        let (manager, mut configuration) = self.create_configuration(ctx)?;
        configuration.owner = event.newOwner;
        tracing::info!(
            configuration = %configuration.id,
            previous = %event.previousOwner,
            owner = %event.newOwner,
            "ownership transferred"
        );
        self.activate(manager, configuration);
        Ok(Applied::Done)
    }

    pub(super) fn module_set(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        event: &ModuleSet,
    ) -> Result<Applied, IndexerError> {
        let Some(r#type) = ModuleType::from_code(event.name) else {
            tracing::debug!(name = %event.name, "unknown module type");
            return Ok(Applied::Skipped(SkipReason::Ignored));
        };
        match r#type {
            ModuleType::OptionFactory => {
                self.register_module::<OptionFactory>(ctx, event.newAddress, WatchKind::OptionFactory)
            }
            ModuleType::OptionHelper => {
                self.register_module::<OptionHelper>(ctx, event.newAddress, WatchKind::OptionHelper)
            }
            ModuleType::PoolFactory => {
                self.register_module::<PoolFactory>(ctx, event.newAddress, WatchKind::PoolFactory)
            }
        }
    }

    fn register_module<M: Module>(
        &mut self,
        ctx: &EventContext<ProtocolEvents>,
        address: Address,
        kind: WatchKind,
    ) -> Result<Applied, IndexerError> {
        let module = M::at(address);
        if self.batch.contains::<M>(&ids::address_id(address)) {
            tracing::debug!(%address, module = ?M::TYPE, "module already registered");
            return Ok(Applied::Skipped(SkipReason::Duplicate));
        }

        let (manager, configuration) = self.create_configuration(ctx)?;
        let configuration = configuration.with_module(M::TYPE, address);
        tracing::info!(
            configuration = %configuration.id,
            %address,
            module = ?M::TYPE,
            "module registered"
        );
        self.batch.upsert(module);
        self.activate(manager, configuration);
        self.watch(address, kind);
        Ok(Applied::Done)
    }
}
