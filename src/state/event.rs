use alloy::{primitives::Log, sol_types::SolEventInterface};

use crate::{
    abi::{
        factory::{OptionAMMFactory::OptionAMMFactoryEvents, OptionFactory::OptionFactoryEvents},
        helper::OptionHelper::OptionHelperEvents,
        manager::ConfigurationManager::ConfigurationManagerEvents,
        option::PodOption::PodOptionEvents,
        pool::{FeePool::FeePoolEvents, OptionAMMPool::OptionAMMPoolEvents},
    },
    watch::WatchKind,
};

/// Decoded protocol event, grouped by the contract kind emitting it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtocolEvents {
    Manager(ConfigurationManagerEvents),
    OptionFactory(OptionFactoryEvents),
    PoolFactory(OptionAMMFactoryEvents),
    Helper(OptionHelperEvents),
    Option(PodOptionEvents),
    Pool(OptionAMMPoolEvents),
    FeePool(FeePoolEvents),
}

impl ProtocolEvents {
    /// Decodes the raw log with the schema of the emitting contract kind.
    ///
    /// Option `Transfer` and token events share signatures, so the schema
    /// can only be picked from the watched address, never from the topic alone.
    pub fn decode(kind: WatchKind, log: &Log) -> Result<Self, alloy::sol_types::Error> {
        Ok(match kind {
            WatchKind::Manager => Self::Manager(ConfigurationManagerEvents::decode_log(log)?.data),
            WatchKind::OptionFactory => {
                Self::OptionFactory(OptionFactoryEvents::decode_log(log)?.data)
            }
            WatchKind::PoolFactory => {
                Self::PoolFactory(OptionAMMFactoryEvents::decode_log(log)?.data)
            }
            WatchKind::OptionHelper => Self::Helper(OptionHelperEvents::decode_log(log)?.data),
            WatchKind::Option => Self::Option(PodOptionEvents::decode_log(log)?.data),
            WatchKind::Pool => Self::Pool(OptionAMMPoolEvents::decode_log(log)?.data),
            WatchKind::FeePool => Self::FeePool(FeePoolEvents::decode_log(log)?.data),
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        primitives::{U256, address},
        sol_types::SolEvent,
    };

    use super::*;
    use crate::abi::{option::PodOption, pool::OptionAMMPool};

    #[test]
    fn test_decode_by_kind() {
        let emitter = address!("0x00000000000000000000000000000000000000b1");
        let mint = PodOption::Mint {
            minter: address!("0x00000000000000000000000000000000000000aa"),
            amount: U256::from(7),
        };
        let log = Log {
            address: emitter,
            data: mint.encode_log_data(),
        };

        assert_eq!(
            ProtocolEvents::decode(WatchKind::Option, &log).ok(),
            Some(ProtocolEvents::Option(PodOptionEvents::Mint(mint)))
        );
        assert!(ProtocolEvents::decode(WatchKind::Pool, &log).is_err());

        let trade = OptionAMMPool::TradeInfo {
            spotPrice: U256::from(1),
            newIV: U256::from(2),
        };
        let log = Log {
            address: emitter,
            data: trade.encode_log_data(),
        };
        assert!(matches!(
            ProtocolEvents::decode(WatchKind::Pool, &log),
            Ok(ProtocolEvents::Pool(OptionAMMPoolEvents::TradeInfo(_)))
        ));
    }
}
