use std::fmt;

use alloy::primitives::U256;

use super::{Action, ActionType};
use crate::ids;

/// Width of an activity bucket.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BucketSpan {
    Hour,
    Day,
}

/// Rollup of one option's actions within a fixed time window.
#[derive(Clone, derive_more::Debug, PartialEq, Eq)]
pub struct OptionActivity {
    pub id: String,
    pub option: String,
    pub span: BucketSpan,
    /// `floor(timestamp / span seconds)`, stable for the bucket's lifetime.
    pub index: u64,
    #[debug("{premium_paid}")]
    pub premium_paid: U256,
    #[debug("{premium_received}")]
    pub premium_received: U256,
    /// Gross options moved.
    #[debug("{options_volume}")]
    pub options_volume: U256,
    /// Gross stable tokens traded or provided.
    #[debug("{tokens_volume}")]
    pub tokens_volume: U256,
    pub actions_count: u64,
}

impl BucketSpan {
    pub const ALL: [BucketSpan; 2] = [BucketSpan::Hour, BucketSpan::Day];

    pub fn seconds(&self) -> u64 {
        match self {
            BucketSpan::Hour => 3_600,
            BucketSpan::Day => 86_400,
        }
    }
}

impl fmt::Display for BucketSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketSpan::Hour => write!(f, "hour"),
            BucketSpan::Day => write!(f, "day"),
        }
    }
}

impl OptionActivity {
    pub(crate) fn open(option_id: &str, span: BucketSpan, timestamp: u64) -> Self {
        let index = ids::bucket_index(timestamp, span);
        Self {
            id: ids::activity_id(option_id, span, index),
            option: option_id.to_string(),
            span,
            index,
            premium_paid: U256::ZERO,
            premium_received: U256::ZERO,
            options_volume: U256::ZERO,
            tokens_volume: U256::ZERO,
            actions_count: 0,
        }
    }

    /// Counts the action and accumulates the volumes its type implies.
    pub(crate) fn apply(&mut self, action: &Action, options_amount: U256) {
        let volumes = Volumes::of(action, options_amount);
        self.actions_count += 1;
        self.premium_paid += volumes.premium_paid;
        self.premium_received += volumes.premium_received;
        self.options_volume += volumes.options;
        self.tokens_volume += volumes.tokens;
    }

    /// Takes back what [`Self::apply`] added for an action that was
    /// superseded within its transaction.
    pub(crate) fn retract(&mut self, action: &Action, options_amount: U256) {
        let volumes = Volumes::of(action, options_amount);
        self.actions_count = self.actions_count.saturating_sub(1);
        self.premium_paid = self.premium_paid.saturating_sub(volumes.premium_paid);
        self.premium_received = self.premium_received.saturating_sub(volumes.premium_received);
        self.options_volume = self.options_volume.saturating_sub(volumes.options);
        self.tokens_volume = self.tokens_volume.saturating_sub(volumes.tokens);
    }
}

/// Volumes a single action contributes to a bucket.
#[derive(Default)]
struct Volumes {
    premium_paid: U256,
    premium_received: U256,
    options: U256,
    tokens: U256,
}

impl Volumes {
    fn of(action: &Action, options_amount: U256) -> Self {
        match action.r#type {
            ActionType::Buy => Self {
                premium_paid: action.input_token_b,
                options: action.output_token_a,
                tokens: action.input_token_b,
                ..Default::default()
            },
            ActionType::Sell => Self {
                premium_received: action.output_token_b,
                options: options_amount,
                tokens: action.output_token_b,
                ..Default::default()
            },
            ActionType::Resell => Self {
                premium_received: action.output_token_b,
                options: action.input_token_a,
                tokens: action.output_token_b,
                ..Default::default()
            },
            ActionType::AddLiquidity => Self {
                options: action.input_token_a,
                tokens: action.input_token_b,
                ..Default::default()
            },
            ActionType::RemoveLiquidity => Self {
                options: action.output_token_a,
                tokens: action.output_token_b,
                ..Default::default()
            },
            ActionType::Mint
            | ActionType::Unmint
            | ActionType::Exercise
            | ActionType::TransferTo
            | ActionType::TransferFrom => Self {
                options: action.option_leg(),
                ..Default::default()
            },
            ActionType::Withdraw => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, TxHash};

    use super::*;

    #[test]
    fn test_open_bucket_identity() {
        let hour = OptionActivity::open("0xbb", BucketSpan::Hour, 7_250);
        assert_eq!(hour.index, 2);
        assert_eq!(hour.id, "Activity-0xbb-hour-2");

        let day = OptionActivity::open("0xbb", BucketSpan::Day, 7_250);
        assert_eq!(day.index, 0);
        assert_eq!(day.id, "Activity-0xbb-day-0");
    }

    #[test]
    fn test_apply_by_type() {
        let mut bucket = OptionActivity::open("0xbb", BucketSpan::Hour, 0);

        let mut buy = Action::new("0x01".to_string(), ActionType::Buy, Address::ZERO, TxHash::ZERO, 0);
        buy.output_token_a = U256::from(2);
        buy.input_token_b = U256::from(20);
        bucket.apply(&buy, U256::from(2));

        let mut exercise =
            Action::new("0x02".to_string(), ActionType::Exercise, Address::ZERO, TxHash::ZERO, 0);
        exercise.input_token_a = U256::from(3);
        exercise.output_token_b = U256::from(300);
        bucket.apply(&exercise, U256::ZERO);

        let withdraw =
            Action::new("0x03".to_string(), ActionType::Withdraw, Address::ZERO, TxHash::ZERO, 0);
        bucket.apply(&withdraw, U256::ZERO);

        assert_eq!(bucket.actions_count, 3);
        assert_eq!(bucket.premium_paid, U256::from(20));
        assert_eq!(bucket.premium_received, U256::ZERO);
        assert_eq!(bucket.options_volume, U256::from(5));
        assert_eq!(bucket.tokens_volume, U256::from(20));
    }

    #[test]
    fn test_retract_restores_bucket() {
        let opened = OptionActivity::open("0xbb", BucketSpan::Day, 0);
        let mut bucket = opened.clone();

        let mut mint = Action::new("0x01".to_string(), ActionType::Mint, Address::ZERO, TxHash::ZERO, 0);
        mint.output_token_a = U256::from(4);
        mint.input_token_b = U256::from(400);
        bucket.apply(&mint, U256::from(4));
        assert_eq!(bucket.options_volume, U256::from(4));

        bucket.retract(&mint, U256::from(4));
        assert_eq!(bucket, opened);

        // Never underflows
        bucket.retract(&mint, U256::from(4));
        assert_eq!(bucket, opened);
    }
}
