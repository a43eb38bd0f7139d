//! General-format number rendering (`%g` / `%G`).
//!
//! A value is printed with `precision` significant digits, in fixed notation
//! when its decimal exponent is in `-4..precision` and in scientific notation
//! otherwise. Trailing zeros and a trailing decimal point are removed.
//!
//! ```
//! use qube_housekeeping::dataset::format::format_general;
//!
//! assert_eq!(format_general(3.14159265358979, 9, false), "3.14159265");
//! assert_eq!(format_general(1234567.0, 6, true), "1.23457E+06");
//! assert_eq!(format_general(42.0, 6, true), "42");
//! ```

/// Significant digits used for floating-point values
pub const FLOAT_PRECISION: usize = 9;

/// Significant digits used for other numeric values
pub const DEFAULT_PRECISION: usize = 6;

/// Decimal exponent from which the default float text switches to scientific
const REPR_EXPONENT_LIMIT: i32 = 16;

/// Render `value` with `precision` significant digits in general format
pub fn format_general(value: f64, precision: usize, uppercase: bool) -> String {
    let precision = precision.max(1);

    let text = if value.is_nan() {
        "nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 { "inf" } else { "-inf" }.to_string()
    } else if value == 0.0 {
        if value.is_sign_negative() { "-0" } else { "0" }.to_string()
    } else {
        // Round to the requested digits first; the exponent of the rounded
        // value picks the notation.
        let scientific = format!("{:.*e}", precision - 1, value);
        let (mantissa, exponent) = match scientific.split_once('e') {
            Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
            None => (scientific.as_str(), 0),
        };

        if exponent < -4 || exponent >= precision as i32 {
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
        } else {
            let decimals = (precision as i32 - 1 - exponent) as usize;
            trim_fraction(&format!("{:.*}", decimals, value)).to_string()
        }
    };

    if uppercase {
        text.to_uppercase()
    } else {
        text
    }
}

/// Default text of a float: shortest round-trip digits
///
/// Fixed notation keeps at least one fractional digit (`2.0`); values below
/// `1e-4` or from `1e16` up use a signed two-digit exponent (`1e-07`, `1e+16`).
pub fn format_repr(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{:e}", value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((mantissa, exponent)) => (mantissa, exponent.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };

    if exponent < -4 || exponent >= REPR_EXPONENT_LIMIT {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", mantissa, sign, exponent.abs())
    } else {
        let fixed = format!("{}", value);
        if fixed.contains('.') {
            fixed
        } else {
            fixed + ".0"
        }
    }
}

fn trim_fraction(digits: &str) -> &str {
    if digits.contains('.') {
        digits.trim_end_matches('0').trim_end_matches('.')
    } else {
        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_digit_floats() {
        assert_eq!(format_general(1.23456789, 9, false), "1.23456789");
        assert_eq!(format_general(3.14159265358979, 9, false), "3.14159265");
        assert_eq!(format_general(0.1, 9, false), "0.1");
        assert_eq!(format_general(2.5, 9, false), "2.5");
        assert_eq!(format_general(-273.15, 9, false), "-273.15");
        assert_eq!(format_general(100.0, 9, false), "100");
    }

    #[test]
    fn test_fixed_notation_boundaries() {
        assert_eq!(format_general(0.0001234, 9, false), "0.0001234");
        assert_eq!(format_general(123456789.0, 9, false), "123456789");
        assert_eq!(format_general(999999.0, 6, true), "999999");
    }

    #[test]
    fn test_scientific_notation() {
        assert_eq!(format_general(0.00001, 9, false), "1e-05");
        assert_eq!(format_general(1234567890.0, 9, false), "1.23456789e+09");
        assert_eq!(format_general(1e100, 9, false), "1e+100");
        assert_eq!(format_general(1234567.0, 6, true), "1.23457E+06");
        assert_eq!(format_general(-0.000012345, 6, true), "-1.2345E-05");
    }

    #[test]
    fn test_rounding_moves_to_scientific() {
        // 999999.5 rounds to 1.00000e6 at six digits
        assert_eq!(format_general(999999.5, 6, true), "1E+06");
    }

    #[test]
    fn test_integers_general_format() {
        assert_eq!(format_general(42.0, 6, true), "42");
        assert_eq!(format_general(-5.0, 6, true), "-5");
        assert_eq!(format_general(0.0, 6, true), "0");
    }

    #[test]
    fn test_special_values() {
        assert_eq!(format_general(f64::NAN, 9, false), "nan");
        assert_eq!(format_general(f64::INFINITY, 9, false), "inf");
        assert_eq!(format_general(f64::NEG_INFINITY, 6, true), "-INF");
        assert_eq!(format_general(-0.0, 9, false), "-0");
    }

    #[test]
    fn test_repr_fixed_notation() {
        assert_eq!(format_repr(2.0), "2.0");
        assert_eq!(format_repr(0.1), "0.1");
        assert_eq!(format_repr(-273.15), "-273.15");
        assert_eq!(format_repr(0.0001), "0.0001");
        assert_eq!(format_repr(1e15), "1000000000000000.0");
        assert_eq!(format_repr(0.0), "0.0");
        assert_eq!(format_repr(-0.0), "-0.0");
    }

    #[test]
    fn test_repr_scientific_notation() {
        assert_eq!(format_repr(1e-7), "1e-07");
        assert_eq!(format_repr(1e16), "1e+16");
        assert_eq!(format_repr(1.5e16), "1.5e+16");
        assert_eq!(format_repr(-2.5e-5), "-2.5e-05");
        assert_eq!(format_repr(1e100), "1e+100");
    }

    #[test]
    fn test_repr_special_values() {
        assert_eq!(format_repr(f64::NAN), "nan");
        assert_eq!(format_repr(f64::INFINITY), "inf");
        assert_eq!(format_repr(f64::NEG_INFINITY), "-inf");
    }

    #[test]
    fn test_zero_precision_treated_as_one() {
        assert_eq!(format_general(123.0, 0, false), "1e+02");
    }
}
