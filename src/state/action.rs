use std::fmt;

use alloy::primitives::{Address, TxHash, U256};

use super::OptionType;

/// Kind of economic event an [`Action`] records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ActionType {
    Buy,
    Sell,
    Resell,
    Mint,
    Unmint,
    Exercise,
    Withdraw,
    AddLiquidity,
    RemoveLiquidity,
    TransferTo,
    TransferFrom,
}

/// One atomic economic event with its token deltas.
///
/// Token A is the option, token B the pool's stable token.
/// Inputs are paid by the user, outputs received by the user.
#[derive(Clone, derive_more::Debug, PartialEq, Eq)]
pub struct Action {
    pub id: String,
    pub r#type: ActionType,
    /// Sender of the transaction.
    pub from: Address,
    pub hash: TxHash,
    pub timestamp: u64,

    pub user: Option<String>,
    pub option: Option<String>,
    pub pool: Option<String>,
    pub option_type: Option<OptionType>,

    #[debug("{input_token_a}")]
    pub input_token_a: U256,
    #[debug("{input_token_b}")]
    pub input_token_b: U256,
    #[debug("{output_token_a}")]
    pub output_token_a: U256,
    #[debug("{output_token_b}")]
    pub output_token_b: U256,

    pub spot_price: Option<String>,
    pub metadata: Option<String>,

    /// Market state right after the action, when live tracking is enabled.
    pub live: Option<LiveSnapshot>,
}

/// Pool and token state captured by the live-state tracker.
///
/// Every field falls back to zero when its read call reverts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiveSnapshot {
    pub next_iv: U256,
    pub next_buying_price: U256,
    pub next_selling_price: U256,
    pub next_dynamic_buying_price: U256,
    pub next_dynamic_selling_price: U256,
    pub next_user_token_a_liquidity: U256,
    pub next_user_token_b_liquidity: U256,
    pub next_tba: U256,
    pub next_tbb: U256,
    pub next_dba: U256,
    pub next_dbb: U256,
    pub next_fees_a: U256,
    pub next_fees_b: U256,
    pub next_collateral_tvl: U256,
    pub next_pool_token_a_tvl: U256,
    pub next_pool_token_b_tvl: U256,
    pub next_user_token_a_original_balance: U256,
    pub next_user_token_b_original_balance: U256,
    pub next_user_snapshot_fimp: U256,
    pub next_ab_price: U256,
}

impl Action {
    pub(crate) fn new(
        id: String,
        r#type: ActionType,
        from: Address,
        hash: TxHash,
        timestamp: u64,
    ) -> Self {
        Self {
            id,
            r#type,
            from,
            hash,
            timestamp,
            user: None,
            option: None,
            pool: None,
            option_type: None,
            input_token_a: U256::ZERO,
            input_token_b: U256::ZERO,
            output_token_a: U256::ZERO,
            output_token_b: U256::ZERO,
            spot_price: None,
            metadata: None,
            live: None,
        }
    }

    /// Amount of options moved, whichever direction they went.
    pub fn option_leg(&self) -> U256 {
        if self.output_token_a.is_zero() {
            self.input_token_a
        } else {
            self.output_token_a
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionType::Buy => "Buy",
            ActionType::Sell => "Sell",
            ActionType::Resell => "Resell",
            ActionType::Mint => "Mint",
            ActionType::Unmint => "Unmint",
            ActionType::Exercise => "Exercise",
            ActionType::Withdraw => "Withdraw",
            ActionType::AddLiquidity => "AddLiquidity",
            ActionType::RemoveLiquidity => "RemoveLiquidity",
            ActionType::TransferTo => "TransferTo",
            ActionType::TransferFrom => "TransferFrom",
        };
        f.write_str(name)
    }
}
