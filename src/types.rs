use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid year label: {0:?}")]
pub struct ParseYearError(pub String);

/// Calendar year as it appears in the source data: a 4-digit label such as `"1979"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Year(u16);

impl Year {
    pub fn new(year: u16) -> Self {
        Self(year)
    }

    pub fn get(self) -> u16 {
        self.0
    }
}

impl FromStr for Year {
    type Err = ParseYearError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        if label.len() != 4 || !label.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseYearError(s.to_string()));
        }
        label
            .parse::<u16>()
            .map(Year)
            .map_err(|_| ParseYearError(s.to_string()))
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}", self.0)
    }
}

impl From<u16> for Year {
    fn from(year: u16) -> Self {
        Year(year)
    }
}

impl Serialize for Year {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct YearVisitor;

impl<'de> Visitor<'de> for YearVisitor {
    type Value = Year;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a 4-digit year as a string or integer")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Year, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Year, E> {
        if (1000..=9999).contains(&v) {
            Ok(Year(v as u16))
        } else {
            Err(E::custom(ParseYearError(v.to_string())))
        }
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Year, E> {
        if v < 0 {
            return Err(E::custom(ParseYearError(v.to_string())));
        }
        self.visit_u64(v as u64)
    }
}

// YAML map keys come through as integers when unquoted and strings when quoted.
impl<'de> Deserialize<'de> for Year {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(YearVisitor)
    }
}

/// How a real-valued quotient is turned into a whole currency amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Ties go to the even neighbour (2.5 -> 2, 3.5 -> 4).
    #[default]
    HalfEven,
    /// Ties go away from zero (2.5 -> 3).
    HalfAwayFromZero,
}

impl RoundingMode {
    pub fn apply(self, value: f64) -> f64 {
        match self {
            RoundingMode::HalfEven => value.round_ties_even(),
            RoundingMode::HalfAwayFromZero => value.round(),
        }
    }
}

/// Run-wide handling of rows whose amount cannot be normalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownPolicy {
    /// Write the sentinel into the adjusted field and leave the row out of charts.
    #[default]
    Sentinel,
    /// Fail the run at the first row that cannot be normalized.
    Abort,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_parsing() {
        assert_eq!("1979".parse::<Year>().unwrap(), Year::new(1979));
        assert_eq!(" 2025 ".parse::<Year>().unwrap(), Year::new(2025));
        assert!("79".parse::<Year>().is_err());
        assert!("19x9".parse::<Year>().is_err());
        assert!("".parse::<Year>().is_err());
    }

    #[test]
    fn test_year_from_yaml_string_and_int() {
        let quoted: Year = serde_yaml::from_str("\"1986\"").unwrap();
        let bare: Year = serde_yaml::from_str("1986").unwrap();
        assert_eq!(quoted, bare);
        assert!(serde_yaml::from_str::<Year>("86").is_err());
    }

    #[test]
    fn test_rounding_modes_differ_on_ties() {
        assert_eq!(RoundingMode::HalfEven.apply(2.5), 2.0);
        assert_eq!(RoundingMode::HalfAwayFromZero.apply(2.5), 3.0);
        assert_eq!(RoundingMode::HalfEven.apply(3.5), 4.0);
        assert_eq!(RoundingMode::HalfAwayFromZero.apply(3.5), 4.0);
        assert_eq!(RoundingMode::HalfEven.apply(2.4), 2.0);
        assert_eq!(RoundingMode::HalfAwayFromZero.apply(2.6), 3.0);
    }
}
