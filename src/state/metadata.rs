use alloy::primitives::U256;

use super::FeeSide;

/// Side channel of a transaction linking fees and bulk sell
/// quantity to its action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Metadata {
    pub id: String,
    pub fee_a: Option<String>,
    pub fee_b: Option<String>,
    pub options_minted_and_sold: Option<U256>,
}

/// Fees withdrawn from one side's fee pool within a transaction.
#[derive(Clone, derive_more::Debug, PartialEq, Eq)]
pub struct Fee {
    pub id: String,
    #[debug("{value}")]
    pub value: U256,
    pub r#type: FeeSide,
    pub fee_pool: String,
    pub action: Option<String>,
    pub metadata: Option<String>,
}

/// Reference price reported by the pool for a transaction.
#[derive(Clone, derive_more::Debug, PartialEq, Eq)]
pub struct SpotPrice {
    pub id: String,
    #[debug("{value}")]
    pub value: U256,
    /// Implied volatility after the trade.
    #[debug("{iv}")]
    pub iv: U256,
    pub action: Option<String>,
}

impl Metadata {
    pub(crate) fn empty(id: String) -> Self {
        Self {
            id,
            fee_a: None,
            fee_b: None,
            options_minted_and_sold: None,
        }
    }

    pub(crate) fn link_fee(&mut self, side: FeeSide, fee_id: String) {
        match side {
            FeeSide::A => self.fee_a = Some(fee_id),
            FeeSide::B => self.fee_b = Some(fee_id),
        }
    }
}
