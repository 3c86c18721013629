use alloy::primitives::{Address, U256};
use fastnum::UD256;

use crate::num;

/// Type of the option series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OptionType {
    Put = 0,
    Call = 1,
}

/// Exercise style of the option series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExerciseType {
    European = 0,
    American = 1,
}

/// Option series deployed by a registered option factory.
#[derive(Clone, derive_more::Debug, PartialEq, Eq)]
pub struct OptionSeries {
    pub id: String,
    pub address: Address,
    /// Deployer of the series.
    pub from: Address,
    pub r#type: OptionType,
    pub exercise_type: ExerciseType,

    pub underlying_asset: Address,
    pub underlying_asset_decimals: u8,
    pub underlying_asset_symbol: String,

    pub strike_asset: Address,
    pub strike_asset_decimals: u8,
    pub strike_asset_symbol: String,

    /// Asset locked to back the options, strike for puts and underlying for calls.
    pub collateral_asset: Address,
    pub collateral_asset_decimals: u8,
    pub collateral_asset_symbol: String,

    #[debug("{strike_price}")]
    pub strike_price: U256,
    pub expiration: u64,
    pub exercise_window_size: u64,
    pub exercise_start: u64,

    pub decimals: u8,
    pub symbol: String,

    pub factory: String,
    pub pool: Option<String>,

    /// Highest observed sum of both fee pool balances.
    #[debug("{series_fee_volume}")]
    pub series_fee_volume: U256,
}

impl OptionSeries {
    /// Strike price in strike asset units.
    pub fn strike_price_decimal(&self) -> UD256 {
        num::Converter::new(self.strike_asset_decimals).from_unsigned(self.strike_price)
    }

    /// Raises the series fee volume, never lowering it.
    /// Returns `true` if the stored value changed.
    pub(crate) fn ratchet_fee_volume(&mut self, volume: U256) -> bool {
        if volume > self.series_fee_volume {
            self.series_fee_volume = volume;
            true
        } else {
            false
        }
    }
}

impl OptionType {
    /// Picks the collateral side: the strike side for puts,
    /// the underlying side for calls.
    pub fn collateral<T>(&self, underlying: T, strike: T) -> T {
        match self {
            OptionType::Put => strike,
            OptionType::Call => underlying,
        }
    }
}

impl TryFrom<u8> for OptionType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OptionType::Put),
            1 => Ok(OptionType::Call),
            other => Err(other),
        }
    }
}

impl TryFrom<u8> for ExerciseType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ExerciseType::European),
            1 => Ok(ExerciseType::American),
            other => Err(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use fastnum::udec256;

    use super::*;

    #[test]
    fn test_collateral_side() {
        assert_eq!(OptionType::Put.collateral("underlying", "strike"), "strike");
        assert_eq!(OptionType::Call.collateral("underlying", "strike"), "underlying");
    }

    #[test]
    fn test_option_type_codes() {
        assert_eq!(OptionType::try_from(0), Ok(OptionType::Put));
        assert_eq!(OptionType::try_from(1), Ok(OptionType::Call));
        assert_eq!(OptionType::try_from(2), Err(2));
        assert_eq!(ExerciseType::try_from(1), Ok(ExerciseType::American));
    }

    #[test]
    fn test_fee_volume_ratchet() {
        let mut option = crate::testing::put_option_series();
        assert!(option.ratchet_fee_volume(U256::from(10)));
        assert!(!option.ratchet_fee_volume(U256::from(7)));
        assert!(!option.ratchet_fee_volume(U256::from(10)));
        assert_eq!(option.series_fee_volume, U256::from(10));
        assert_eq!(option.strike_price_decimal(), udec256!(100));
    }
}
