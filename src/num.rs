use alloy::primitives::U256;
use fastnum::{
    UD256, bint,
    decimal::{Context, RoundingMode, UnsignedDecimal},
};

/// Number of implied decimal digits of exchange token and collateral amounts.
pub const EXCHANGE_DECIMALS: u8 = 6;

/// Fixed-point to decimal converter.
#[derive(Clone, Copy, Debug)]
pub struct Converter {
    decimals: i32,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(EXCHANGE_DECIMALS)
    }
}

impl Converter {
    pub fn new(decimals: u8) -> Self {
        Self {
            decimals: decimals as i32,
        }
    }

    /// Converts fixed-point integer into decimal, lossless.
    pub fn from_unsigned(&self, value: U256) -> UD256 {
        let unscaled = bint::UInt::<4>::from_le_slice(value.as_le_slice())
            .expect("Converter: U256 -> UInt::<4>");
        UnsignedDecimal::<4>::from_parts(
            unscaled,
            -self.decimals,
            Context::default().with_rounding_mode(RoundingMode::Floor),
        )
    }

    /// Parses fixed-point amount as it appears in fill records and converts
    /// it into decimal.
    ///
    /// Unparseable amounts are treated as zero.
    pub fn parse_unsigned(&self, value: &str) -> UD256 {
        match parse_fixed(value) {
            Some(fixed) => self.from_unsigned(fixed),
            None => {
                tracing::debug!(value, "unparseable fixed-point amount, using zero");
                UD256::ZERO
            }
        }
    }
}

/// Parses an unsigned fixed-point integer from its textual form.
///
/// Accepts decimal integers and non-negative integral floats
/// (`"1000000.0"`), which get truncated. Hex input and floats not
/// representable in 128 bits are rejected.
pub fn parse_fixed(value: &str) -> Option<U256> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    U256::from_str_radix(value, 10).ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && *f >= 0.0 && *f < u128::MAX as f64)
            .map(|f| U256::from(f.trunc() as u128))
    })
}

/// Parses a unix timestamp in seconds, zero if unparseable.
pub fn parse_timestamp(value: &str) -> i64 {
    let value = value.trim();
    value
        .parse::<i64>()
        .ok()
        .or_else(|| {
            value
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        })
        .unwrap_or_else(|| {
            tracing::debug!(value, "unparseable timestamp, using zero");
            0
        })
}

#[cfg(test)]
mod tests {
    use fastnum::udec256;

    use super::*;

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
        assert_eq!(Converter::default().from_unsigned(U256::ZERO), UD256::ZERO);
    }

    #[test]
    fn test_numeric_converter_parse_unsigned() {
        let c = Converter::default();
        assert_eq!(c.parse_unsigned("10000000"), udec256!(10));
        assert_eq!(c.parse_unsigned("2400000"), udec256!(2.4));
        assert_eq!(c.parse_unsigned(" 6000000 "), udec256!(6));
        assert_eq!(c.parse_unsigned("1000000.0"), udec256!(1));
        assert_eq!(c.parse_unsigned(""), UD256::ZERO);
        assert_eq!(c.parse_unsigned("n/a"), UD256::ZERO);
        assert_eq!(c.parse_unsigned("-5"), UD256::ZERO);
    }

    #[test]
    fn test_parse_fixed_large_values() {
        let token =
            "73817598408230683831072353847770809458837920203753987347670649717002095543451";
        assert_eq!(parse_fixed(token).map(|v| v.to_string()), Some(token.to_string()));
    }

    #[test]
    fn test_parse_fixed_rejects_hex_and_overflowing_floats() {
        assert_eq!(parse_fixed("0x10"), None);
        assert_eq!(parse_fixed("0X10"), None);
        assert_eq!(parse_fixed("1e40"), None);
        assert_eq!(parse_fixed("1e20"), Some(U256::from(10u128.pow(20))));
        assert_eq!(Converter::default().parse_unsigned("0x10"), UD256::ZERO);
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(parse_timestamp("1751515200"), 1751515200);
        assert_eq!(parse_timestamp("1751515200.0"), 1751515200);
        assert_eq!(parse_timestamp("yesterday"), 0);
        assert_eq!(parse_timestamp(""), 0);
    }
}
