//! Normalization
//!
//! Values read back from the backend or from local storage can't be trusted to keep their
//! type: prices turn up as numbers or numeric strings, and instants turn up as timestamp
//! wrappers, ISO strings, bare dates or epoch milliseconds. Every ingestion boundary runs
//! them through the one function per field kind defined here.

use std::str::FromStr;

use jiff::{
    Timestamp,
    civil::{Date, DateTime, Time},
    tz::TimeZone,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An amount of money as it may arrive from storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAmount {
    /// A JSON number.
    Number(serde_json::Number),

    /// A numeric string, e.g. `"12.50"`.
    Text(String),
}

/// An instant in time as it may arrive from the backend or a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawInstant {
    /// Backend timestamp wrapper.
    Wrapper {
        /// Whole seconds since the Unix epoch.
        #[serde(alias = "_seconds")]
        seconds: i64,

        /// Sub-second nanoseconds.
        #[serde(default, alias = "_nanoseconds")]
        nanoseconds: i32,
    },

    /// Milliseconds since the Unix epoch.
    Millis(i64),

    /// RFC 3339 timestamp, civil date-time, or bare date (read as UTC).
    Text(String),
}

/// Coerce a raw amount into a decimal. Returns `None` for anything that isn't a number.
pub fn amount(raw: &RawAmount) -> Option<Decimal> {
    match raw {
        RawAmount::Number(number) => parse_decimal(&number.to_string()),
        RawAmount::Text(text) => parse_decimal(text.trim()),
    }
}

/// Coerce a raw instant into a [`Timestamp`]. Returns `None` when the value can't be read.
pub fn instant(raw: &RawInstant) -> Option<Timestamp> {
    match raw {
        RawInstant::Wrapper {
            seconds,
            nanoseconds,
        } => Timestamp::new(*seconds, *nanoseconds).ok(),
        RawInstant::Millis(millis) => Timestamp::from_millisecond(*millis).ok(),
        RawInstant::Text(text) => parse_instant_text(text),
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    if text.is_empty() {
        return None;
    }

    Decimal::from_str(text)
        .or_else(|_err| Decimal::from_scientific(text))
        .ok()
}

fn parse_instant_text(text: &str) -> Option<Timestamp> {
    let text = text.trim();

    if let Ok(timestamp) = text.parse::<Timestamp>() {
        return Some(timestamp);
    }

    let civil = text
        .parse::<DateTime>()
        .ok()
        .or_else(|| {
            text.parse::<Date>()
                .ok()
                .map(|date| date.to_datetime(Time::midnight()))
        })?;

    civil
        .to_zoned(TimeZone::UTC)
        .ok()
        .map(|zoned| zoned.timestamp())
}

/// Anything that may be read as an instant in time.
pub trait ToInstant {
    /// Normalize into a [`Timestamp`], or `None` when unreadable.
    fn to_instant(&self) -> Option<Timestamp>;
}

impl ToInstant for Timestamp {
    fn to_instant(&self) -> Option<Timestamp> {
        Some(*self)
    }
}

impl ToInstant for RawInstant {
    fn to_instant(&self) -> Option<Timestamp> {
        instant(self)
    }
}

impl ToInstant for str {
    fn to_instant(&self) -> Option<Timestamp> {
        parse_instant_text(self)
    }
}

impl ToInstant for String {
    fn to_instant(&self) -> Option<Timestamp> {
        parse_instant_text(self)
    }
}

/// Serde adapters running the normalizers during deserialization.
pub mod de {
    use jiff::Timestamp;
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, de::Error as _};

    use super::{RawAmount, RawInstant};

    /// Deserialize a required amount from a number or numeric string.
    ///
    /// # Errors
    ///
    /// Fails when the value is neither a number nor a numeric string.
    pub fn amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let raw = RawAmount::deserialize(deserializer)?;

        super::amount(&raw).ok_or_else(|| D::Error::custom(format!("invalid amount: {raw:?}")))
    }

    /// Deserialize an optional amount; unreadable values become `None`.
    ///
    /// # Errors
    ///
    /// Fails only when the input isn't valid for the underlying format.
    pub fn optional_amount<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Decimal>, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;

        Ok(raw
            .and_then(|value| serde_json::from_value::<RawAmount>(value).ok())
            .as_ref()
            .and_then(super::amount))
    }

    /// Deserialize an optional instant; unreadable values become `None`.
    ///
    /// # Errors
    ///
    /// Fails only when the input isn't valid for the underlying format.
    pub fn optional_instant<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Timestamp>, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;

        Ok(raw
            .and_then(|value| serde_json::from_value::<RawInstant>(value).ok())
            .as_ref()
            .and_then(super::instant))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn amount_accepts_numbers_and_numeric_strings() -> TestResult {
        let number: RawAmount = serde_json::from_value(json!(12.5))?;
        let text: RawAmount = serde_json::from_value(json!(" 12.50 "))?;
        let integer: RawAmount = serde_json::from_value(json!(30))?;

        assert_eq!(amount(&number), Some(Decimal::new(125, 1)));
        assert_eq!(amount(&text), Some(Decimal::new(1250, 2)));
        assert_eq!(amount(&integer), Some(Decimal::from(30)));

        Ok(())
    }

    #[test]
    fn amount_rejects_non_numeric_text() {
        assert_eq!(amount(&RawAmount::Text("twelve".to_string())), None);
        assert_eq!(amount(&RawAmount::Text(String::new())), None);
    }

    #[test]
    fn instant_reads_backend_wrapper() -> TestResult {
        let raw: RawInstant =
            serde_json::from_value(json!({ "seconds": 1_700_000_000, "nanoseconds": 5 }))?;

        assert_eq!(instant(&raw), Some(Timestamp::new(1_700_000_000, 5)?));

        Ok(())
    }

    #[test]
    fn instant_reads_underscored_wrapper() -> TestResult {
        let raw: RawInstant = serde_json::from_value(json!({ "_seconds": 10, "_nanoseconds": 0 }))?;

        assert_eq!(instant(&raw), Some(Timestamp::from_second(10)?));

        Ok(())
    }

    #[test]
    fn instant_reads_iso_strings_and_bare_dates() -> TestResult {
        let iso = RawInstant::Text("2025-03-01T12:00:00.000Z".to_string());
        let date = RawInstant::Text("2025-03-01".to_string());

        assert_eq!(instant(&iso), Some("2025-03-01T12:00:00Z".parse::<Timestamp>()?));
        assert_eq!(instant(&date), Some("2025-03-01T00:00:00Z".parse::<Timestamp>()?));

        Ok(())
    }

    #[test]
    fn instant_reads_epoch_millis() -> TestResult {
        let raw: RawInstant = serde_json::from_value(json!(1_000))?;

        assert_eq!(instant(&raw), Some(Timestamp::from_second(1)?));

        Ok(())
    }

    #[test]
    fn instant_fails_closed_on_garbage() {
        assert_eq!(instant(&RawInstant::Text("soon".to_string())), None);
        assert_eq!("".to_instant(), None);
    }

    #[test]
    fn optional_adapters_swallow_unreadable_values() -> TestResult {
        #[derive(Deserialize)]
        struct Doc {
            #[serde(default, deserialize_with = "de::optional_amount")]
            price: Option<Decimal>,

            #[serde(default, deserialize_with = "de::optional_instant")]
            ends: Option<Timestamp>,
        }

        let doc: Doc = serde_json::from_value(json!({ "price": "abc", "ends": true }))?;

        assert_eq!(doc.price, None);
        assert_eq!(doc.ends, None);

        let doc: Doc = serde_json::from_value(json!({}))?;

        assert_eq!(doc.price, None);
        assert_eq!(doc.ends, None);

        Ok(())
    }
}
