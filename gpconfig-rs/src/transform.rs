/* Unit and encoding conversions between the controller's wire format and the
 * values shown in a configuration UI.
 *
 * Wire side: milliseconds, raw integer codes, raw bytes.
 * UI side: seconds/minutes, `0x..` strings, base64 text, loosely typed form
 * values that may arrive as numbers or as strings. */

use std::fmt;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

pub const MILLIS_PER_SECOND: i64 = 1_000;
pub const MILLIS_PER_MINUTE: i64 = 60_000;

/// A loosely typed value coming from (or going to) a form field.
///
/// Form inputs hand back text even for numeric settings, so every integer
/// field on the outbound path goes through [`FormValue::to_int`], which
/// follows the usual `parseInt` rules. A value that does not coerce is
/// "not a number" and ends up as JSON `null` on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValue(pub Value);

impl FormValue {
    pub fn null() -> Self {
        FormValue(Value::Null)
    }

    /* Integral floats collapse to integers so `3000 / 1000` reads as `3`. */
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
            return FormValue(Value::from(value as i64));
        }
        FormValue(Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null))
    }

    pub fn is_null(&self) -> bool {
        self.0.is_null()
    }

    /* Integer coercion; `None` means not-a-number. */
    pub fn to_int(&self) -> Option<i64> {
        parse_int(&self.0)
    }

    /* JavaScript truthiness: 0, "", null, false are falsy. */
    pub fn is_truthy(&self) -> bool {
        match &self.0 {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }
}

impl fmt::Display for FormValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            Value::Null => f.write_str("-"),
            other => write!(f, "{}", other),
        }
    }
}

impl From<i64> for FormValue {
    fn from(value: i64) -> Self {
        FormValue(Value::from(value))
    }
}

impl From<&str> for FormValue {
    fn from(value: &str) -> Self {
        FormValue(Value::from(value))
    }
}

impl From<String> for FormValue {
    fn from(value: String) -> Self {
        FormValue(Value::from(value))
    }
}

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        FormValue(value)
    }
}

/* Integer coercion with `parseInt` semantics.
 *
 * Numbers truncate toward zero. Strings: leading whitespace, optional sign,
 * `0x` selects base 16, then the longest digit prefix. Everything else is
 * not-a-number. Magnitudes beyond `i64` saturate at the bound. */
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_int_str(s),
        _ => None,
    }
}

pub fn parse_int_str(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let (radix, digits) = match rest.get(..2) {
        Some("0x") | Some("0X") => (16, &rest[2..]),
        _ => (10, rest),
    };
    let mut magnitude: Option<i64> = None;
    for digit in digits.chars().map_while(|c| c.to_digit(radix)) {
        let acc = magnitude.unwrap_or(0);
        magnitude = Some(
            acc.saturating_mul(i64::from(radix))
                .saturating_add(i64::from(digit)),
        );
    }
    let magnitude = magnitude?;
    Some(if negative { -magnitude } else { magnitude })
}

/* Wire milliseconds -> UI units (seconds or minutes). */
pub fn millis_to_units(millis: i64, scale: i64) -> FormValue {
    FormValue::from_f64(millis as f64 / scale as f64)
}

/* UI units -> wire milliseconds. Fractions are dropped before scaling. */
pub fn units_to_millis(units: &FormValue, scale: i64) -> Option<i64> {
    units.to_int()?.checked_mul(scale)
}

pub fn seconds_from_millis(millis: i64) -> FormValue {
    millis_to_units(millis, MILLIS_PER_SECOND)
}

pub fn millis_from_seconds(seconds: &FormValue) -> Option<i64> {
    units_to_millis(seconds, MILLIS_PER_SECOND)
}

pub fn minutes_from_millis(millis: i64) -> FormValue {
    millis_to_units(millis, MILLIS_PER_MINUTE)
}

pub fn millis_from_minutes(minutes: &FormValue) -> Option<i64> {
    units_to_millis(minutes, MILLIS_PER_MINUTE)
}

/* I2C address as shown in the UI, e.g. `60` -> `"0x3c"`. The sign stays in
 * front of the magnitude, so `-5` reads `"0x-5"`. */
pub fn format_i2c_address(address: i64) -> String {
    if address < 0 {
        format!("0x-{:x}", address.unsigned_abs())
    } else {
        format!("0x{:x}", address)
    }
}

/* Splash bitmaps travel as standard, padded, unwrapped base64. */
pub fn encode_splash_image(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_int_follows_form_rules() {
        assert_eq!(parse_int(&json!("32")), Some(32));
        assert_eq!(parse_int(&json!("  42abc")), Some(42));
        assert_eq!(parse_int(&json!("-7")), Some(-7));
        assert_eq!(parse_int(&json!("0x3c")), Some(60));
        assert_eq!(parse_int(&json!("0X3C")), Some(60));
        assert_eq!(parse_int(&json!("1.9")), Some(1));
        assert_eq!(parse_int(&json!(3.9)), Some(3));
        assert_eq!(parse_int(&json!(-3.9)), Some(-3));
        assert_eq!(parse_int(&json!(17)), Some(17));
    }

    #[test]
    fn parse_int_saturates_long_digit_runs() {
        assert_eq!(parse_int(&json!("99999999999999999999")), Some(i64::MAX));
        assert_eq!(parse_int(&json!("-99999999999999999999")), Some(-i64::MAX));
        assert_eq!(parse_int(&json!("0xffffffffffffffffff")), Some(i64::MAX));
        assert_eq!(parse_int(&json!(1e20)), Some(i64::MAX));
        assert_eq!(millis_from_seconds(&FormValue::from("99999999999999999999")), None);
    }

    #[test]
    fn parse_int_not_a_number() {
        assert_eq!(parse_int(&json!("")), None);
        assert_eq!(parse_int(&json!("abc")), None);
        assert_eq!(parse_int(&json!("0x")), None);
        assert_eq!(parse_int(&json!("-")), None);
        assert_eq!(parse_int(&json!(null)), None);
        assert_eq!(parse_int(&json!(true)), None);
        assert_eq!(parse_int(&json!([1])), None);
    }

    #[test]
    fn whole_seconds_round_trip() {
        for v in [0i64, 1, 3, 59, 3600, 86_400] {
            let millis = millis_from_seconds(&FormValue::from(v)).expect("numeric");
            assert_eq!(seconds_from_millis(millis), FormValue::from(v));
        }
    }

    #[test]
    fn whole_minutes_round_trip() {
        for v in [0i64, 1, 2, 10, 720] {
            let millis = millis_from_minutes(&FormValue::from(v)).expect("numeric");
            assert_eq!(minutes_from_millis(millis), FormValue::from(v));
        }
    }

    #[test]
    fn fractional_units_are_truncated_outbound() {
        assert_eq!(millis_from_seconds(&FormValue::from("2.75")), Some(2_000));
        assert_eq!(seconds_from_millis(1_500), FormValue(json!(1.5)));
    }

    #[test]
    fn unit_overflow_is_not_a_number() {
        assert_eq!(millis_from_minutes(&FormValue::from(i64::MAX)), None);
    }

    #[test]
    fn i2c_address_is_lowercase_hex() {
        assert_eq!(format_i2c_address(60), "0x3c");
        assert_eq!(format_i2c_address(0x78), "0x78");
        assert_eq!(format_i2c_address(-5), "0x-5");
        assert_eq!(format_i2c_address(i64::MIN), "0x-8000000000000000");
    }

    #[test]
    fn splash_payload_decodes_back() {
        let encoded = encode_splash_image(&[0, 1, 2]);
        assert_eq!(encoded, "AAEC");
        assert_eq!(STANDARD.decode(encoded).expect("valid base64"), vec![0, 1, 2]);
    }

    #[test]
    fn truthiness() {
        assert!(!FormValue::null().is_truthy());
        assert!(!FormValue::from(0).is_truthy());
        assert!(!FormValue::from("").is_truthy());
        assert!(FormValue::from("0").is_truthy());
        assert!(FormValue::from(2).is_truthy());
    }
}
