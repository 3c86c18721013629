use alloy::primitives::{U256, U512};
use fastnum::{
    bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

/// `10^decimals` as a fixed-point scale.
pub fn pow10(decimals: u8) -> U256 {
    U256::from(10).pow(U256::from(decimals))
}

/// Converts an option amount into strike token units:
/// `strike_price * amount / 10^decimals`, truncating toward zero to
/// match the on-chain fixed-point arithmetic.
///
/// The product is widened to 512 bits when it overflows, only a quotient
/// beyond 256 bits saturates.
pub fn strike_amount(strike_price: U256, amount: U256, decimals: u8) -> U256 {
    if let Some(product) = strike_price.checked_mul(amount) {
        return product / pow10(decimals);
    }
    let wide = U512::from(strike_price) * U512::from(amount) / U512::from(pow10(decimals));
    if wide > U512::from(U256::MAX) {
        tracing::warn!(%strike_price, %amount, decimals, "strike amount exceeds 256 bits");
    }
    wide.saturating_to::<U256>()
}

/// Fixed-point to decimal converter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Converter {
    decimals: i32,
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    pub fn from_unsigned<const N: usize>(&self, value: U256) -> UnsignedDecimal<N> {
        let unscaled = bint::UInt::<N>::from_le_slice(value.as_le_slice())
            .expect("Converter: U256 -> UInt::<N>");
        UnsignedDecimal::<N>::from_parts(
            unscaled,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }
}

#[cfg(test)]
mod tests {
    use fastnum::udec256;

    use super::*;

    #[test]
    fn test_strike_amount_truncates() {
        // 100 USDC strike, 3 options with 18 decimals
        assert_eq!(
            strike_amount(
                U256::from(100_000000u64),
                U256::from(3_000000000000000000u64),
                18
            ),
            U256::from(300_000000u64)
        );
        // 2.5 options at 6 decimals with strike 3 -> 7.5 floors to 7
        assert_eq!(
            strike_amount(U256::from(3), U256::from(2_500000u64), 6),
            U256::from(7)
        );
        assert_eq!(
            strike_amount(U256::from(999), U256::from(1), 3),
            U256::ZERO
        );
    }

    #[test]
    fn test_strike_amount_widens_on_overflow() {
        // Product overflows 256 bits, quotient fits
        assert_eq!(strike_amount(U256::MAX, pow10(18), 18), U256::MAX);
        assert_eq!(
            strike_amount(U256::MAX / U256::from(2), U256::from(20), 1),
            U256::MAX - U256::from(1)
        );
        assert_eq!(strike_amount(U256::MAX, U256::MAX, 0), U256::MAX);
    }

    #[test]
    fn test_pow10() {
        assert_eq!(pow10(0), U256::from(1));
        assert_eq!(pow10(6), U256::from(1_000_000));
        assert_eq!(pow10(18), U256::from(10u64.pow(18)));
    }

    #[test]
    fn test_numeric_converter_from_unsigned() {
        assert_eq!(
            Converter::new(0).from_unsigned(U256::from(1234567890)),
            udec256!(1234567890)
        );
        assert_eq!(
            Converter::new(6).from_unsigned(U256::from(1234567890)),
            udec256!(1234.56789)
        );
        assert_eq!(
            Converter::new(12).from_unsigned(U256::from(1234567890)),
            udec256!(0.00123456789)
        );
    }
}
