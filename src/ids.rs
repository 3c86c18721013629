//! Deterministic identifiers of indexed entities.
//!
//! Every key is derived from event data only, so reducing the same event
//! always addresses the same rows.

use alloy::primitives::{Address, B256, TxHash};

use crate::state::{BucketSpan, FeeSide};

/// Identifier of the singleton [`crate::state::Manager`].
pub const MANAGER_ID: &str = "Manager";

/// Module type code of the AMM pool factory.
pub const MODULE_AMM_FACTORY: B256 = module_code(b"AMM_FACTORY");

/// Module type code of the option factory.
pub const MODULE_OPTION_FACTORY: B256 = module_code(b"OPTION_FACTORY");

/// Module type code of the option helper.
pub const MODULE_OPTION_HELPER: B256 = module_code(b"OPTION_HELPER");

/// Suffix of the sender leg of a transfer.
pub const TRANSFER_FROM_SUFFIX: &str = "2";

/// ASCII name right-padded with zeros to 32 bytes, as emitted by `ModuleSet`.
const fn module_code(name: &[u8]) -> B256 {
    let mut code = [0u8; 32];
    let mut i = 0;
    while i < name.len() {
        code[i] = name[i];
        i += 1;
    }
    B256::new(code)
}

/// Lower-case 0x-prefixed hex of an address.
pub fn address_id(address: Address) -> String {
    format!("{address:#x}")
}

/// Lower-case 0x-prefixed hex of a transaction hash.
pub fn tx_id(hash: TxHash) -> String {
    format!("{hash:#x}")
}

pub fn configuration_id(hash: TxHash) -> String {
    format!("Configuration-{}", tx_id(hash))
}

pub fn position_id(user_id: &str, option_id: &str) -> String {
    format!("Position-{user_id}-{option_id}")
}

/// Action identifier, the bare transaction id unless suffixed.
pub fn action_id(tx_id: &str, suffix: Option<&str>) -> String {
    match suffix {
        Some(suffix) => format!("{tx_id}-{suffix}"),
        None => tx_id.to_string(),
    }
}

pub fn fee_id(tx_id: &str, side: FeeSide) -> String {
    format!("Fee-{tx_id}-{side}")
}

pub fn activity_id(option_id: &str, span: BucketSpan, index: u64) -> String {
    format!("Activity-{option_id}-{span}-{index}")
}

/// Index of the bucket the timestamp falls into.
pub fn bucket_index(timestamp: u64, span: BucketSpan) -> u64 {
    timestamp / span.seconds()
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{address, b256};

    use super::*;

    #[test]
    fn test_address_id_is_lower_case() {
        assert_eq!(
            address_id(address!("0x1acB2299Fa7285ABBB251a6075a31C4AeE1772D6")),
            "0x1acb2299fa7285abbb251a6075a31c4aee1772d6"
        );
    }

    #[test]
    fn test_composite_ids() {
        let hash = b256!("0x47de82c4aa40baa30cabac4a74568488a8c74ded85a4e905f1ceaad4f29945e3");
        let tx = tx_id(hash);
        assert_eq!(
            configuration_id(hash),
            "Configuration-0x47de82c4aa40baa30cabac4a74568488a8c74ded85a4e905f1ceaad4f29945e3"
        );
        assert_eq!(action_id(&tx, None), tx);
        assert_eq!(action_id(&tx, Some("2")), format!("{tx}-2"));
        assert_eq!(fee_id(&tx, FeeSide::B), format!("Fee-{tx}-B"));
        assert_eq!(position_id("0xaa", "0xbb"), "Position-0xaa-0xbb");
        assert_eq!(
            activity_id("0xbb", BucketSpan::Hour, 7),
            "Activity-0xbb-hour-7"
        );
    }

    #[test]
    fn test_bucket_index_boundaries() {
        assert_eq!(bucket_index(3599, BucketSpan::Hour), 0);
        assert_eq!(bucket_index(3600, BucketSpan::Hour), 1);
        assert_eq!(bucket_index(86399, BucketSpan::Day), 0);
        assert_eq!(bucket_index(86400, BucketSpan::Day), 1);
    }

    #[test]
    fn test_module_codes() {
        assert_eq!(
            MODULE_OPTION_FACTORY,
            b256!("0x4f5054494f4e5f464143544f5259000000000000000000000000000000000000")
        );
        assert_ne!(MODULE_AMM_FACTORY, MODULE_OPTION_HELPER);
    }
}
