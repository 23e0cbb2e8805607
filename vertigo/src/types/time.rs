use time::{
    Date, OffsetDateTime, PrimitiveDateTime, format_description::BorrowedFormatItem as I,
    macros::format_description,
};

use super::DataType;
use crate::row::DecodeError;

const DATE: &[I<'_>] = format_description!("[year]-[month]-[day]");

const TIMESTAMP: &[I<'_>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]"
);

const TIMESTAMPTZ: &[I<'_>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]][offset_hour sign:mandatory][optional [:[offset_minute]]]"
);

const TIMESTAMP_OUT: &[I<'_>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]"
);

const TIMESTAMPTZ_OUT: &[I<'_>] = format_description!(
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6][offset_hour sign:mandatory]:[offset_minute]"
);

pub(crate) fn parse_date(text: &str) -> Result<Date, DecodeError> {
    Date::parse(text, DATE).map_err(|_| DecodeError::parse(DataType::Date, text))
}

pub(crate) fn parse_timestamp(text: &str) -> Result<PrimitiveDateTime, DecodeError> {
    PrimitiveDateTime::parse(text, TIMESTAMP)
        .map_err(|_| DecodeError::parse(DataType::Timestamp, text))
}

pub(crate) fn parse_timestamptz(text: &str) -> Result<OffsetDateTime, DecodeError> {
    OffsetDateTime::parse(text, TIMESTAMPTZ)
        .map_err(|_| DecodeError::parse(DataType::TimestampTz, text))
}

pub(crate) fn format_date(date: Date) -> String {
    date.format(DATE).expect("format is statically known")
}

pub(crate) fn format_timestamp(ts: PrimitiveDateTime) -> String {
    ts.format(TIMESTAMP_OUT).expect("format is statically known")
}

pub(crate) fn format_timestamptz(ts: OffsetDateTime) -> String {
    ts.format(TIMESTAMPTZ_OUT).expect("format is statically known")
}

#[cfg(test)]
mod test {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn text_output() {
        assert_eq!(
            format_timestamp(datetime!(2024-01-02 03:04:05.5)),
            "2024-01-02 03:04:05.500000"
        );
        assert_eq!(
            format_timestamptz(datetime!(2024-01-02 03:04:05 -03:30)),
            "2024-01-02 03:04:05.000000-03:30"
        );
    }

    #[test]
    fn offset_without_minutes() {
        let ts = parse_timestamptz("2001-09-09 01:46:40+00").unwrap();
        assert_eq!(ts.unix_timestamp(), 1_000_000_000);
    }
}
