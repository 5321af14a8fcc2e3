use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Number, Value};

use crate::source;

/// A bonus as printed on the sheet.
///
/// Positive values serialize as a `"+N"` string; zero, negative and missing
/// values serialize as a bare number, with missing rendered as `0`.
#[derive(Debug, Clone, PartialEq)]
pub enum Bonus {
    Positive(Number),
    Plain(Number),
}

impl Bonus {
    pub fn zero() -> Self {
        Self::Plain(Number::from(0))
    }

    pub fn from_number(n: Number) -> Self {
        if n.as_f64().is_some_and(|v| v > 0.0) {
            Self::Positive(n)
        } else {
            Self::Plain(n)
        }
    }

    pub fn from_f64(value: f64) -> Self {
        Self::from_number(number_from_f64(value))
    }

}

impl Default for Bonus {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Bonus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Positive(n) => write!(f, "+{n}"),
            Self::Plain(n) => write!(f, "{n}"),
        }
    }
}

impl Serialize for Bonus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Positive(_) => serializer.collect_str(self),
            Self::Plain(n) => n.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Bonus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BonusVisitor;

        impl Visitor<'_> for BonusVisitor {
            type Value = Bonus;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a number or a \"+N\" string")
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Bonus, E> {
                Ok(Bonus::Plain(Number::from(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Bonus, E> {
                Ok(Bonus::Plain(Number::from(v)))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Bonus, E> {
                Number::from_f64(v)
                    .map(Bonus::Plain)
                    .ok_or_else(|| E::custom("bonus must be finite"))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Bonus, E> {
                let digits = v.strip_prefix('+').unwrap_or(v);
                source::number(Some(&Value::String(digits.to_string())))
                    .map(Bonus::from_number)
                    .ok_or_else(|| E::custom(format!("invalid bonus '{v}'")))
            }
        }

        deserializer.deserialize_any(BonusVisitor)
    }
}

/// Signed-bonus formatting for a raw source value.
///
/// Missing or non-numeric input yields `0`; numeric strings are accepted.
pub fn format_signed_bonus(value: Option<&Value>) -> Bonus {
    source::number(value).map(Bonus::from_number).unwrap_or_default()
}

/// Integral results stay integers so `5.0` prints as `5`.
pub fn number_from_f64(value: f64) -> Number {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        return Number::from(value as i64);
    }
    Number::from_f64(value).unwrap_or_else(|| Number::from(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn positive_values_gain_a_plus_sign() {
        assert_eq!(serde_json::to_value(format_signed_bonus(Some(&json!(5)))).unwrap(), json!("+5"));
    }

    #[test]
    fn zero_and_negative_stay_numeric() {
        assert_eq!(serde_json::to_value(format_signed_bonus(Some(&json!(0)))).unwrap(), json!(0));
        assert_eq!(serde_json::to_value(format_signed_bonus(Some(&json!(-3)))).unwrap(), json!(-3));
    }

    #[test]
    fn missing_is_numeric_zero() {
        assert_eq!(serde_json::to_value(format_signed_bonus(None)).unwrap(), json!(0));
        assert_eq!(
            serde_json::to_value(format_signed_bonus(Some(&Value::Null))).unwrap(),
            json!(0)
        );
    }

    #[test]
    fn serialized_bonus_parses_back() {
        for raw in [json!(7), json!(0), json!(-2), json!(1.5)] {
            let bonus = format_signed_bonus(Some(&raw));
            let text = serde_json::to_string(&bonus).unwrap();
            let back: Bonus = serde_json::from_str(&text).unwrap();
            assert_eq!(back, bonus);
        }
    }

    #[test]
    fn integral_floats_collapse_to_integers() {
        assert_eq!(Bonus::from_f64(21.0).to_string(), "+21");
        assert_eq!(Bonus::from_f64(-0.5).to_string(), "-0.5");
    }
}
