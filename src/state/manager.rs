use alloy::primitives::Address;

use crate::ids;

/// Singleton protocol registry pointing at the active configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manager {
    pub id: String,
    pub configuration: String,
}

/// Snapshot of the protocol owner and active modules.
///
/// Never mutated once saved, every change produces a successor
/// snapshot keyed by the transaction that caused it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Configuration {
    pub id: String,
    pub manager: String,
    pub owner: Address,
    pub option_factory: Option<String>,
    pub option_helper: Option<String>,
    pub pool_factory: Option<String>,
}

/// Kind of a module announced by the configuration manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ModuleType {
    OptionFactory,
    OptionHelper,
    PoolFactory,
}

/// Registered option factory module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionFactory {
    pub id: String,
    pub address: Address,
}

/// Registered option helper module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionHelper {
    pub id: String,
    pub address: Address,
}

/// Registered AMM pool factory module.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolFactory {
    pub id: String,
    pub address: Address,
}

/// Module entity constructible from its announced address.
pub trait Module: crate::store::Entity {
    const TYPE: ModuleType;

    fn at(address: Address) -> Self;
}

impl Configuration {
    /// Initial configuration, owned by nobody and with no modules.
    pub(crate) fn genesis(id: String, manager: String) -> Self {
        Self {
            id,
            manager,
            owner: Address::ZERO,
            option_factory: None,
            option_helper: None,
            pool_factory: None,
        }
    }

    /// Copy of this configuration under a new identity.
    pub(crate) fn successor(&self, id: String) -> Self {
        Self { id, ..self.clone() }
    }

    /// Points the module slot of the given type to the address.
    pub(crate) fn with_module(mut self, r#type: ModuleType, address: Address) -> Self {
        let id = Some(ids::address_id(address));
        match r#type {
            ModuleType::OptionFactory => self.option_factory = id,
            ModuleType::OptionHelper => self.option_helper = id,
            ModuleType::PoolFactory => self.pool_factory = id,
        }
        self
    }
}

impl ModuleType {
    /// Module type announced by the padded `ModuleSet` name, if known.
    pub fn from_code(code: alloy::primitives::B256) -> Option<Self> {
        match code {
            c if c == ids::MODULE_AMM_FACTORY => Some(Self::PoolFactory),
            c if c == ids::MODULE_OPTION_FACTORY => Some(Self::OptionFactory),
            c if c == ids::MODULE_OPTION_HELPER => Some(Self::OptionHelper),
            _ => None,
        }
    }
}

impl Module for OptionFactory {
    const TYPE: ModuleType = ModuleType::OptionFactory;

    fn at(address: Address) -> Self {
        Self {
            id: ids::address_id(address),
            address,
        }
    }
}

impl Module for OptionHelper {
    const TYPE: ModuleType = ModuleType::OptionHelper;

    fn at(address: Address) -> Self {
        Self {
            id: ids::address_id(address),
            address,
        }
    }
}

impl Module for PoolFactory {
    const TYPE: ModuleType = ModuleType::PoolFactory;

    fn at(address: Address) -> Self {
        Self {
            id: ids::address_id(address),
            address,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{B256, address};

    use super::*;

    #[test]
    fn test_successor_copies_forward() {
        let genesis = Configuration::genesis("Configuration-0x01".to_string(), "Manager".to_string())
            .with_module(
                ModuleType::OptionFactory,
                address!("0x1acB2299Fa7285ABBB251a6075a31C4AeE1772D6"),
            );
        let next = genesis.successor("Configuration-0x02".to_string());

        assert_eq!(next.id, "Configuration-0x02");
        assert_eq!(next.manager, genesis.manager);
        assert_eq!(next.owner, genesis.owner);
        assert_eq!(
            next.option_factory.as_deref(),
            Some("0x1acb2299fa7285abbb251a6075a31c4aee1772d6")
        );
        assert_eq!(next.pool_factory, None);
    }

    #[test]
    fn test_module_type_from_code() {
        assert_eq!(
            ModuleType::from_code(ids::MODULE_AMM_FACTORY),
            Some(ModuleType::PoolFactory)
        );
        assert_eq!(
            ModuleType::from_code(ids::MODULE_OPTION_HELPER),
            Some(ModuleType::OptionHelper)
        );
        assert_eq!(ModuleType::from_code(B256::ZERO), None);
    }
}
