use time::{
    format_description::well_known::Rfc3339, Date, OffsetDateTime, PrimitiveDateTime, Time,
    UtcOffset,
};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

/// Wall-clock "now" at `offset`, truncated to whole seconds.
pub(crate) fn local_now(offset: UtcOffset) -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc().to_offset(offset);
    PrimitiveDateTime::new(now.date(), truncate_seconds(now.time()))
}

pub(crate) fn truncate_seconds(value: Time) -> Time {
    value.replace_nanosecond(0).unwrap_or(value)
}

/// Last representable second of `date`.
pub(crate) fn end_of_day(date: Date) -> PrimitiveDateTime {
    PrimitiveDateTime::new(date, Time::from_hms(23, 59, 59).unwrap_or(Time::MIDNIGHT))
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime, time};

    #[test]
    fn format_primitive_outputs_utc_z() {
        let value = PrimitiveDateTime::new(date!(2025 - 01 - 02), time!(10:20:30));
        assert_eq!(format_primitive(value), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn truncate_seconds_drops_fraction() {
        let value = time!(10:20:30.75);
        assert_eq!(truncate_seconds(value), time!(10:20:30));
    }

    #[test]
    fn end_of_day_is_last_second() {
        assert_eq!(end_of_day(date!(2024 - 02 - 29)), datetime!(2024-02-29 23:59:59));
    }

    #[test]
    fn local_now_applies_offset() {
        let offset = UtcOffset::from_hms(5, 0, 0).unwrap();
        let local = local_now(offset).assume_offset(offset);
        let drift = (OffsetDateTime::now_utc() - local).whole_seconds().abs();
        assert!(drift <= 2, "drift {drift}s");
    }
}
