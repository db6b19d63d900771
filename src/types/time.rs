//! Date and time coercion.
//!
//! The API represents points in time three ways: an ISO-8601 date
//! (`2014-09-06`), an ISO-8601 datetime with an offset
//! (`2014-09-06T13:40:00+01:00`), or a `{ "time": ..., "tzid": ... }` object.
//! Inbound values are coerced into [`DateOrTime`] / [`EventTime`]; outbound
//! values are encoded through [`TimeValue`].

use crate::errors::{CalendarError, CalendarResult};
use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Prefix of every coercion failure message.
///
/// Coercions run inside serde deserialization, where only a message survives;
/// the decoder uses this prefix to report such failures as coercion errors.
pub(crate) const COERCION_ERROR_PREFIX: &str = "Cannot coerce";

const DATE_FORMAT: &str = "%Y-%m-%d";

fn coercion_error(value: impl fmt::Display, target: &str) -> CalendarError {
    CalendarError::coercion(format!(
        "{} {} to {}",
        COERCION_ERROR_PREFIX, value, target
    ))
}

fn parse_time(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Renders an instant as UTC ISO-8601 with a `Z` suffix and whole seconds.
pub fn to_iso8601(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Either a civil date or an absolute instant.
///
/// A date never equals a time, even when the time falls on that date. Times
/// are normalised to UTC when coerced, so equal instants written with
/// different offsets compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateOrTime {
    /// A civil date with no time of day.
    Date(NaiveDate),
    /// An absolute instant.
    Time(DateTime<Utc>),
}

impl DateOrTime {
    /// Coerces a value into a date or time.
    ///
    /// Strings are tried as an ISO-8601 datetime first, as it is the more
    /// precise of the two, then as a `YYYY-MM-DD` date.
    pub fn coerce(value: impl IntoDateOrTime) -> CalendarResult<Self> {
        value.into_date_or_time()
    }

    /// Returns the date, if this is a date.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Time(_) => None,
        }
    }

    /// Returns the instant, if this is a time.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Time(time) => Some(*time),
            Self::Date(_) => None,
        }
    }

    /// Returns true if this is a date.
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Returns true if this is a time.
    pub fn is_time(&self) -> bool {
        matches!(self, Self::Time(_))
    }

    /// Returns the date, taking the UTC date of a time.
    pub fn to_date(&self) -> NaiveDate {
        match self {
            Self::Date(date) => *date,
            Self::Time(time) => time.date_naive(),
        }
    }

    /// Returns the instant, taking UTC midnight of a date.
    pub fn to_time(&self) -> DateTime<Utc> {
        match self {
            Self::Time(time) => *time,
            Self::Date(date) => Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)),
        }
    }
}

impl fmt::Display for DateOrTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            Self::Time(time) => f.write_str(&to_iso8601(time)),
        }
    }
}

impl Serialize for DateOrTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DateOrTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::coerce(&value).map_err(de::Error::custom)
    }
}

/// Conversion into a [`DateOrTime`].
///
/// Values that already are dates or instants convert unchanged, which keeps
/// coercion idempotent.
pub trait IntoDateOrTime {
    /// Performs the conversion.
    fn into_date_or_time(self) -> CalendarResult<DateOrTime>;
}

impl IntoDateOrTime for DateOrTime {
    fn into_date_or_time(self) -> CalendarResult<DateOrTime> {
        Ok(self)
    }
}

impl IntoDateOrTime for NaiveDate {
    fn into_date_or_time(self) -> CalendarResult<DateOrTime> {
        Ok(DateOrTime::Date(self))
    }
}

impl<Tz: TimeZone> IntoDateOrTime for DateTime<Tz> {
    fn into_date_or_time(self) -> CalendarResult<DateOrTime> {
        Ok(DateOrTime::Time(self.with_timezone(&Utc)))
    }
}

impl IntoDateOrTime for &str {
    fn into_date_or_time(self) -> CalendarResult<DateOrTime> {
        if let Some(time) = parse_time(self) {
            return Ok(DateOrTime::Time(time));
        }

        parse_date(self)
            .map(DateOrTime::Date)
            .ok_or_else(|| coercion_error(format!("\"{}\"", self), "DateOrTime"))
    }
}

impl IntoDateOrTime for &String {
    fn into_date_or_time(self) -> CalendarResult<DateOrTime> {
        self.as_str().into_date_or_time()
    }
}

impl IntoDateOrTime for String {
    fn into_date_or_time(self) -> CalendarResult<DateOrTime> {
        self.as_str().into_date_or_time()
    }
}

impl IntoDateOrTime for &Value {
    fn into_date_or_time(self) -> CalendarResult<DateOrTime> {
        match self {
            Value::String(s) => s.as_str().into_date_or_time(),
            other => Err(coercion_error(other, "DateOrTime")),
        }
    }
}

/// Coerces an ISO-8601 datetime into a UTC instant.
///
/// Used for fields such as `created` and `updated`, which are always full
/// timestamps; a bare date is rejected.
pub fn coerce_time(value: &Value) -> CalendarResult<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_time(s).ok_or_else(|| coercion_error(format!("\"{}\"", s), "Time")),
        other => Err(coercion_error(other, "Time")),
    }
}

/// Serde adapter applying [`coerce_time`] to an optional field.
pub mod iso8601_time {
    use super::*;

    /// Deserializes an optional ISO-8601 instant.
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => coerce_time(&value).map(Some).map_err(de::Error::custom),
        }
    }

    /// Serializes an optional instant as UTC ISO-8601.
    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(time) => serializer.serialize_str(&to_iso8601(time)),
            None => serializer.serialize_none(),
        }
    }
}

/// A date or time together with the timezone it was expressed in.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventTime {
    /// The date or instant.
    pub time: DateOrTime,
    /// IANA timezone identifier, kept verbatim.
    pub tzid: Option<String>,
}

impl EventTime {
    /// Creates an event time.
    pub fn new(time: DateOrTime, tzid: Option<String>) -> Self {
        Self { time, tzid }
    }

    /// Coerces a JSON value into an event time.
    ///
    /// A string is coerced as a [`DateOrTime`] with no timezone. An object
    /// has its `time` key coerced and its `tzid` key kept as is.
    pub fn coerce(value: &Value) -> CalendarResult<Self> {
        match value {
            Value::String(_) => Ok(Self::new(DateOrTime::coerce(value)?, None)),
            Value::Object(map) => {
                let time = map
                    .get("time")
                    .ok_or_else(|| coercion_error(value, "EventTime"))?;
                let tzid = map.get("tzid").and_then(Value::as_str).map(String::from);
                Ok(Self::new(DateOrTime::coerce(time)?, tzid))
            }
            other => Err(coercion_error(other, "EventTime")),
        }
    }
}

impl From<DateOrTime> for EventTime {
    fn from(time: DateOrTime) -> Self {
        Self::new(time, None)
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.tzid {
            None => self.time.serialize(serializer),
            Some(tzid) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("time", &self.time)?;
                map.serialize_entry("tzid", tzid)?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for EventTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::coerce(&value).map_err(de::Error::custom)
    }
}

/// A time value supplied by a caller for a request body or query string.
///
/// Serializing encodes it: instants as UTC ISO-8601 with `Z`, dates as
/// `YYYY-MM-DD`, strings as given (they are assumed to be encoded already),
/// and objects with their `time` key encoded and every other key untouched.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeValue {
    /// An absolute instant.
    Time(DateTime<Utc>),
    /// A civil date.
    Date(NaiveDate),
    /// A pre-encoded string.
    Encoded(String),
    /// An object with a `time` key, such as `{ "time": ..., "tzid": ... }`.
    Mapping {
        /// The value of the `time` key.
        time: Box<TimeValue>,
        /// All other keys.
        rest: Map<String, Value>,
    },
    /// Any other JSON value, passed through.
    Json(Value),
}

impl TimeValue {
    /// Pairs a time with a timezone identifier.
    pub fn with_tzid(time: impl Into<TimeValue>, tzid: impl Into<String>) -> Self {
        let mut rest = Map::new();
        rest.insert("tzid".to_string(), Value::String(tzid.into()));
        Self::Mapping {
            time: Box::new(time.into()),
            rest,
        }
    }

    /// Builds a time value from untyped JSON.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::String(s) => Self::Encoded(s),
            Value::Object(mut map) => match map.remove("time") {
                Some(time) => Self::Mapping {
                    time: Box::new(Self::from_json(time)),
                    rest: map,
                },
                None => Self::Json(Value::Object(map)),
            },
            other => Self::Json(other),
        }
    }

    /// Encodes this value as it is sent to the API.
    pub fn encode(&self) -> Value {
        match self {
            Self::Time(time) => Value::String(to_iso8601(time)),
            Self::Date(date) => Value::String(date.format(DATE_FORMAT).to_string()),
            Self::Encoded(s) => Value::String(s.clone()),
            Self::Mapping { time, rest } => {
                let mut map = rest.clone();
                map.insert("time".to_string(), time.encode());
                Value::Object(map)
            }
            Self::Json(value) => value.clone(),
        }
    }

    /// Encodes this value for a query string parameter.
    pub fn to_query_value(&self) -> String {
        match self.encode() {
            Value::String(s) => s,
            other => other.to_string(),
        }
    }
}

impl Serialize for TimeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Time(time) => serializer.serialize_str(&to_iso8601(time)),
            Self::Date(date) => serializer.collect_str(&date.format(DATE_FORMAT)),
            Self::Encoded(s) => serializer.serialize_str(s),
            Self::Mapping { .. } | Self::Json(_) => self.encode().serialize(serializer),
        }
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for TimeValue {
    fn from(time: DateTime<Tz>) -> Self {
        Self::Time(time.with_timezone(&Utc))
    }
}

impl From<NaiveDate> for TimeValue {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<&str> for TimeValue {
    fn from(s: &str) -> Self {
        Self::Encoded(s.to_string())
    }
}

impl From<String> for TimeValue {
    fn from(s: String) -> Self {
        Self::Encoded(s)
    }
}

impl From<DateOrTime> for TimeValue {
    fn from(value: DateOrTime) -> Self {
        match value {
            DateOrTime::Date(date) => Self::Date(date),
            DateOrTime::Time(time) => Self::Time(time),
        }
    }
}

impl From<EventTime> for TimeValue {
    fn from(value: EventTime) -> Self {
        match value.tzid {
            Some(tzid) => Self::with_tzid(value.time, tzid),
            None => value.time.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CalendarErrorKind;
    use chrono::FixedOffset;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_coerce_takes_offset_into_account() {
        let utc = DateOrTime::coerce("2015-04-20T06:00:00Z").unwrap();
        let local = DateOrTime::coerce("2015-04-20T07:00:00+01:00").unwrap();
        assert_eq!(utc, local);
        assert!(utc.is_time());
    }

    #[test]
    fn test_coerce_date() {
        let date = DateOrTime::coerce("2014-09-06").unwrap();
        assert!(date.is_date());
        assert_eq!(date.date(), NaiveDate::from_ymd_opt(2014, 9, 6));
        assert_eq!(date, DateOrTime::coerce("2014-09-06").unwrap());
    }

    #[test]
    fn test_date_never_equals_time() {
        let date = DateOrTime::coerce("2014-09-06").unwrap();
        let time = DateOrTime::coerce("2014-09-06T00:00:00Z").unwrap();
        assert_ne!(date, time);
        assert_eq!(date.to_time(), time.to_time());
        assert_eq!(date.to_date(), time.to_date());
    }

    #[test]
    fn test_coerce_is_idempotent() {
        let time = Utc.with_ymd_and_hms(2014, 8, 5, 15, 30, 0).unwrap();
        let coerced = DateOrTime::coerce(time).unwrap();
        assert_eq!(coerced, DateOrTime::Time(time));
        assert_eq!(DateOrTime::coerce(coerced).unwrap(), coerced);

        let date = NaiveDate::from_ymd_opt(2014, 8, 5).unwrap();
        assert_eq!(DateOrTime::coerce(date).unwrap(), DateOrTime::Date(date));
    }

    #[test]
    fn test_coerce_failure() {
        let err = DateOrTime::coerce("next tuesday").unwrap_err();
        assert_eq!(err.kind(), CalendarErrorKind::Coercion);
        assert!(err.message().starts_with(COERCION_ERROR_PREFIX));

        let err = DateOrTime::coerce(&json!(42)).unwrap_err();
        assert_eq!(err.kind(), CalendarErrorKind::Coercion);
    }

    #[test]
    fn test_event_time_from_mapping() {
        let value = json!({ "time": "2014-09-06T13:40:00+01:00", "tzid": "Europe/London" });
        let event_time = EventTime::coerce(&value).unwrap();

        assert_eq!(
            event_time.time,
            DateOrTime::coerce("2014-09-06T12:40:00Z").unwrap()
        );
        assert_eq!(event_time.tzid.as_deref(), Some("Europe/London"));
    }

    #[test]
    fn test_event_time_equality_requires_tzid() {
        let london = EventTime::coerce(&json!({ "time": "2014-09-06", "tzid": "Europe/London" })).unwrap();
        let bare = EventTime::coerce(&json!("2014-09-06")).unwrap();
        assert_ne!(london, bare);
        assert_eq!(bare, EventTime::from(DateOrTime::coerce("2014-09-06").unwrap()));
    }

    #[test]
    fn test_event_time_serde_round_trip() {
        let value = json!({ "time": "2014-09-06T12:40:00Z", "tzid": "Europe/London" });
        let event_time: EventTime = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(serde_json::to_value(&event_time).unwrap(), value);

        let bare: EventTime = serde_json::from_value(json!("2014-09-06")).unwrap();
        assert_eq!(serde_json::to_value(&bare).unwrap(), json!("2014-09-06"));
    }

    #[test]
    fn test_coerce_time_rejects_dates() {
        assert!(coerce_time(&json!("2014-09-01T08:00:01Z")).is_ok());
        assert_eq!(
            coerce_time(&json!("2014-09-01")).unwrap_err().kind(),
            CalendarErrorKind::Coercion
        );
    }

    #[test]
    fn test_time_value_encoding() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let local = offset.with_ymd_and_hms(2014, 8, 5, 16, 30, 0).unwrap();

        assert_eq!(TimeValue::from(local).encode(), json!("2014-08-05T15:30:00Z"));
        assert_eq!(
            TimeValue::from(NaiveDate::from_ymd_opt(2014, 8, 5).unwrap()).encode(),
            json!("2014-08-05")
        );
        assert_eq!(
            TimeValue::from("2014-08-05T15:30:00+01:00").encode(),
            json!("2014-08-05T15:30:00+01:00")
        );
        assert_eq!(
            TimeValue::with_tzid(local, "Europe/London").encode(),
            json!({ "time": "2014-08-05T15:30:00Z", "tzid": "Europe/London" })
        );
    }

    #[test]
    fn test_time_value_from_json() {
        let value = TimeValue::from_json(json!({ "time": "2014-08-05", "tzid": "Etc/UTC" }));
        assert_eq!(
            serde_json::to_value(&value).unwrap(),
            json!({ "time": "2014-08-05", "tzid": "Etc/UTC" })
        );

        let passthrough = TimeValue::from_json(json!({ "tzid": "Etc/UTC" }));
        assert_eq!(passthrough.encode(), json!({ "tzid": "Etc/UTC" }));
    }
}
