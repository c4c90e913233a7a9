//! Wire formats for exam dates and times.
//!
//! Output is always `YYYY-MM-DD`, `HH:MM:SS` and RFC 3339 UTC. Input is
//! lenient: older exports used `DD-MM-YYYY`, `HH:MM`, `hh:mm AM` and full
//! timestamps in place of dates.

use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

use crate::core::time::format_primitive;

const DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const DATE_LEGACY: &[BorrowedFormatItem<'static>] = format_description!("[day]-[month]-[year]");
const TIME: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]:[second]");
const TIME_FRACTION: &[BorrowedFormatItem<'static>] =
    format_description!("[hour]:[minute]:[second].[subsecond]");
const TIME_SHORT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");
const TIME_12H: &[BorrowedFormatItem<'static>] =
    format_description!("[hour repr:12]:[minute] [period case_sensitive:false]");
const TIME_12H_UNPADDED: &[BorrowedFormatItem<'static>] =
    format_description!("[hour repr:12 padding:none]:[minute] [period case_sensitive:false]");
const TIMESTAMP_SPACE: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const TIMESTAMP_T: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

pub(crate) fn parse_date(raw: &str) -> Option<Date> {
    let raw = raw.trim();
    if let Ok(value) = Date::parse(raw, DATE) {
        return Some(value);
    }
    if let Ok(value) = Date::parse(raw, DATE_LEGACY) {
        return Some(value);
    }
    // Some exporters wrote DATE columns as midnight timestamps.
    OffsetDateTime::parse(raw, &Rfc3339).ok().map(|value| value.to_offset(UtcOffset::UTC).date())
}

pub(crate) fn parse_time(raw: &str) -> Option<Time> {
    let raw = raw.trim();
    [TIME, TIME_FRACTION, TIME_SHORT, TIME_12H, TIME_12H_UNPADDED]
        .into_iter()
        .find_map(|format| Time::parse(raw, format).ok())
        .map(|value| value.replace_nanosecond(0).unwrap_or(value))
}

pub(crate) fn parse_timestamp(raw: &str) -> Option<PrimitiveDateTime> {
    let raw = raw.trim();
    if let Ok(value) = OffsetDateTime::parse(raw, &Rfc3339) {
        let utc = value.to_offset(UtcOffset::UTC);
        return Some(PrimitiveDateTime::new(utc.date(), utc.time()));
    }
    [TIMESTAMP_SPACE, TIMESTAMP_T]
        .into_iter()
        .find_map(|format| PrimitiveDateTime::parse(raw, format).ok())
}

pub(crate) fn format_date(value: Date) -> String {
    value.format(DATE).unwrap_or_else(|_| value.to_string())
}

pub(crate) fn format_time(value: Time) -> String {
    value.format(TIME).unwrap_or_else(|_| value.to_string())
}

pub(crate) mod date {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub(crate) fn serialize<S: Serializer>(value: &Date, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_date(*value))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Date, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_date(&raw).ok_or_else(|| D::Error::custom(format!("invalid date: {raw}")))
    }
}

pub(crate) mod time_of_day {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::Time;

    pub(crate) fn serialize<S: Serializer>(value: &Time, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_time(*value))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Time, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_time(&raw).ok_or_else(|| D::Error::custom(format!("invalid time: {raw}")))
    }
}

pub(crate) mod timestamp {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};
    use time::PrimitiveDateTime;

    pub(crate) fn serialize<S: Serializer>(
        value: &PrimitiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_primitive(*value))
    }

    pub(crate) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<PrimitiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }
}
