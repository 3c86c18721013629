use std::fmt;

use alloy::primitives::Address;

/// AMM liquidity pool of a single option series.
///
/// Token A is the option itself, token B the stable token it trades against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pool {
    pub id: String,
    pub address: Address,
    /// Deployer of the pool.
    pub from: Address,
    pub option: String,
    pub factory: String,

    pub token_a: Address,
    pub token_a_decimals: u8,
    pub token_a_symbol: String,

    pub token_b: Address,
    pub token_b_decimals: u8,
    pub token_b_symbol: String,

    pub fee_pool_a: Option<String>,
    pub fee_pool_b: Option<String>,
}

/// Side of a pool, A being the option and B the stable token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeeSide {
    A,
    B,
}

/// Sub-ledger contract accumulating the fees of one pool side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeePool {
    pub id: String,
    pub address: Address,
    pub r#type: FeeSide,
    pub pool: String,
}

impl Pool {
    pub fn fee_pool(&self, side: FeeSide) -> Option<&str> {
        match side {
            FeeSide::A => self.fee_pool_a.as_deref(),
            FeeSide::B => self.fee_pool_b.as_deref(),
        }
    }

    pub fn token(&self, side: FeeSide) -> Address {
        match side {
            FeeSide::A => self.token_a,
            FeeSide::B => self.token_b,
        }
    }

    pub(crate) fn link_fee_pool(&mut self, side: FeeSide, fee_pool_id: String) {
        match side {
            FeeSide::A => self.fee_pool_a = Some(fee_pool_id),
            FeeSide::B => self.fee_pool_b = Some(fee_pool_id),
        }
    }
}

impl FeeSide {
    pub const ALL: [FeeSide; 2] = [FeeSide::A, FeeSide::B];
}

impl fmt::Display for FeeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeeSide::A => write!(f, "A"),
            FeeSide::B => write!(f, "B"),
        }
    }
}
