use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceError {
    #[error("A valid number is required")]
    Invalid,

    #[error("Ensure this value is greater than or equal to 0")]
    Negative,

    #[error("Ensure that there are no more than {0} decimal places")]
    TooManyDecimalPlaces(usize),

    #[error("Ensure that there are no more than {0} digits before the decimal point")]
    TooManyWholeDigits(usize),
}

/// Fixed-point recipe price, stored as a whole number of cents.
///
/// Accepts at most [`Price::MAX_DIGITS`] significant digits of which
/// [`Price::DECIMAL_PLACES`] are after the point, so the largest value is
/// `999.99`. Always rendered with two decimals (`"5.00"`).
///
/// # Examples
///
/// ```rust
/// use pantry::domain::Price;
///
/// let price: Price = "5.5".parse().unwrap();
/// assert_eq!(price.cents(), 550);
/// assert_eq!(price.to_string(), "5.50");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Price(i64);

impl Price {
    pub const DECIMAL_PLACES: usize = 2;
    pub const MAX_DIGITS: usize = 5;
    const WHOLE_DIGITS: usize = Self::MAX_DIGITS - Self::DECIMAL_PLACES;

    /// Wraps a raw cent amount as read back from storage.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        debug_assert!(cents >= 0, "Price should be non-negative");
        Self(cents)
    }

    #[must_use]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    pub fn parse(raw: &str) -> Result<Self, PriceError> {
        let raw = raw.trim();

        if let Some(rest) = raw.strip_prefix('-') {
            return match Self::parse(rest) {
                Ok(price) if price.0 == 0 => Ok(price),
                Ok(_) => Err(PriceError::Negative),
                Err(e) => Err(e),
            };
        }

        let raw = raw.strip_prefix('+').unwrap_or(raw);
        let (whole, frac) = raw.split_once('.').unwrap_or((raw, ""));

        if whole.is_empty() && frac.is_empty() {
            return Err(PriceError::Invalid);
        }
        if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(PriceError::Invalid);
        }
        if frac.len() > Self::DECIMAL_PLACES {
            return Err(PriceError::TooManyDecimalPlaces(Self::DECIMAL_PLACES));
        }

        let significant = whole.trim_start_matches('0');
        if significant.len() > Self::WHOLE_DIGITS {
            return Err(PriceError::TooManyWholeDigits(Self::WHOLE_DIGITS));
        }

        let whole_value: i64 = if significant.is_empty() {
            0
        } else {
            significant.parse().map_err(|_| PriceError::Invalid)?
        };

        let frac_value: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| PriceError::Invalid)? * 10,
            _ => frac.parse().map_err(|_| PriceError::Invalid)?,
        };

        Ok(Self(whole_value * 100 + frac_value))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Price {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PriceVisitor;

        impl de::Visitor<'_> for PriceVisitor {
            type Value = Price;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal price as a string or number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
                Price::parse(v).map_err(E::custom)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
                Price::parse(&v.to_string()).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
                Price::parse(&v.to_string()).map_err(E::custom)
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
                if !v.is_finite() {
                    return Err(E::custom(PriceError::Invalid));
                }
                Price::parse(&v.to_string()).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(PriceVisitor)
    }
}
