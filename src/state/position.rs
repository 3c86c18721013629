use alloy::primitives::{Address, U256};

use super::{Action, ActionType, OptionSeries, OptionType};
use crate::ids;

/// Wallet participating in the protocol.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub address: Address,
}

/// Cumulative ledger of one user's activity in one option series.
///
/// All counters are running sums of action deltas and never decrease,
/// except the `remaining_*` fields which snapshot the redeemable liquidity
/// as of the last liquidity-affecting action.
#[derive(Clone, derive_more::Debug, PartialEq, Eq)]
pub struct Position {
    pub id: String,
    pub user: String,
    pub option: String,
    pub expiration: u64,
    pub option_type: OptionType,

    #[debug("{premium_paid}")]
    pub premium_paid: U256,
    #[debug("{premium_received}")]
    pub premium_received: U256,

    #[debug("{options_bought}")]
    pub options_bought: U256,
    #[debug("{options_sold}")]
    pub options_sold: U256,
    #[debug("{options_resold}")]
    pub options_resold: U256,

    #[debug("{options_minted}")]
    pub options_minted: U256,
    #[debug("{options_unminted}")]
    pub options_unminted: U256,

    #[debug("{initial_options_provided}")]
    pub initial_options_provided: U256,
    #[debug("{initial_tokens_provided}")]
    pub initial_tokens_provided: U256,
    #[debug("{final_options_removed}")]
    pub final_options_removed: U256,
    #[debug("{final_tokens_removed}")]
    pub final_tokens_removed: U256,
    #[debug("{remaining_options_provided}")]
    pub remaining_options_provided: U256,
    #[debug("{remaining_tokens_provided}")]
    pub remaining_tokens_provided: U256,

    #[debug("{options_sent}")]
    pub options_sent: U256,
    #[debug("{options_received}")]
    pub options_received: U256,

    #[debug("{options_exercised}")]
    pub options_exercised: U256,
    #[debug("{underlying_withdrawn}")]
    pub underlying_withdrawn: U256,
    #[debug("{strike_withdrawn}")]
    pub strike_withdrawn: U256,
}

impl User {
    pub(crate) fn at(address: Address) -> Self {
        Self {
            id: ids::address_id(address),
            address,
        }
    }
}

impl Position {
    pub(crate) fn open(user: &User, option: &OptionSeries) -> Self {
        Self {
            id: ids::position_id(&user.id, &option.id),
            user: user.id.clone(),
            option: option.id.clone(),
            expiration: option.expiration,
            option_type: option.r#type,
            premium_paid: U256::ZERO,
            premium_received: U256::ZERO,
            options_bought: U256::ZERO,
            options_sold: U256::ZERO,
            options_resold: U256::ZERO,
            options_minted: U256::ZERO,
            options_unminted: U256::ZERO,
            initial_options_provided: U256::ZERO,
            initial_tokens_provided: U256::ZERO,
            final_options_removed: U256::ZERO,
            final_tokens_removed: U256::ZERO,
            remaining_options_provided: U256::ZERO,
            remaining_tokens_provided: U256::ZERO,
            options_sent: U256::ZERO,
            options_received: U256::ZERO,
            options_exercised: U256::ZERO,
            underlying_withdrawn: U256::ZERO,
            strike_withdrawn: U256::ZERO,
        }
    }

    /// Accumulates the counters the action type implies.
    ///
    /// `options_amount` is the quantity of options the action moved, only
    /// consulted for sells where it is not carried by the deltas.
    pub(crate) fn apply(&mut self, action: &Action, options_amount: U256) {
        match action.r#type {
            ActionType::Buy => {
                self.options_bought += action.output_token_a;
                self.premium_paid += action.input_token_b;
            }
            ActionType::Sell => {
                self.options_sold += options_amount;
                self.premium_received += action.output_token_b;
            }
            ActionType::Resell => {
                self.options_resold += action.input_token_a;
                self.premium_received += action.output_token_b;
            }
            ActionType::Mint => self.options_minted += action.output_token_a,
            ActionType::Unmint => self.options_unminted += action.input_token_a,
            ActionType::Exercise => self.options_exercised += action.input_token_a,
            ActionType::Withdraw => {
                self.underlying_withdrawn += action.output_token_a;
                self.strike_withdrawn += action.output_token_b;
            }
            ActionType::AddLiquidity => {
                self.initial_options_provided += action.input_token_a;
                self.initial_tokens_provided += action.input_token_b;
            }
            ActionType::RemoveLiquidity => {
                self.final_options_removed += action.output_token_a;
                self.final_tokens_removed += action.output_token_b;
            }
            ActionType::TransferFrom => self.options_sent += action.input_token_a,
            ActionType::TransferTo => self.options_received += action.output_token_a,
        }
    }

    /// Overwrites the redeemable liquidity snapshot.
    pub(crate) fn update_remaining(&mut self, options: U256, tokens: U256) {
        self.remaining_options_provided = options;
        self.remaining_tokens_provided = tokens;
    }
}

impl ActionType {
    /// Whether the action changes the user's pool liquidity.
    pub fn affects_liquidity(&self) -> bool {
        matches!(
            self,
            ActionType::Withdraw | ActionType::AddLiquidity | ActionType::RemoveLiquidity
        )
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{TxHash, address};

    use super::*;
    use crate::testing;

    fn action(r#type: ActionType) -> Action {
        Action::new("0x01".to_string(), r#type, Address::ZERO, TxHash::ZERO, 0)
    }

    #[test]
    fn test_apply_accumulates() {
        let user = User::at(address!("0x00000000000000000000000000000000000000aa"));
        let option = testing::put_option_series();
        let mut pos = Position::open(&user, &option);
        assert_eq!(pos.id, format!("Position-{}-{}", user.id, option.id));

        let mut buy = action(ActionType::Buy);
        buy.output_token_a = U256::from(5);
        buy.input_token_b = U256::from(50);
        pos.apply(&buy, U256::from(5));
        pos.apply(&buy, U256::from(5));
        assert_eq!(pos.options_bought, U256::from(10));
        assert_eq!(pos.premium_paid, U256::from(100));

        let mut sell = action(ActionType::Sell);
        sell.output_token_b = U256::from(30);
        sell.input_token_b = U256::from(300);
        pos.apply(&sell, U256::from(3));
        assert_eq!(pos.options_sold, U256::from(3));
        assert_eq!(pos.premium_received, U256::from(30));

        let mut withdraw = action(ActionType::Withdraw);
        withdraw.output_token_a = U256::from(1);
        withdraw.output_token_b = U256::from(2);
        pos.apply(&withdraw, U256::ZERO);
        assert_eq!(pos.underlying_withdrawn, U256::from(1));
        assert_eq!(pos.strike_withdrawn, U256::from(2));
        assert_eq!(pos.options_minted, U256::ZERO);
    }

    #[test]
    fn test_transfer_legs() {
        let user = User::at(address!("0x00000000000000000000000000000000000000aa"));
        let mut pos = Position::open(&user, &testing::put_option_series());

        let mut sent = action(ActionType::TransferFrom);
        sent.input_token_a = U256::from(4);
        let mut received = action(ActionType::TransferTo);
        received.output_token_a = U256::from(9);
        pos.apply(&sent, U256::ZERO);
        pos.apply(&received, U256::ZERO);

        assert_eq!(pos.options_sent, U256::from(4));
        assert_eq!(pos.options_received, U256::from(9));
    }
}
