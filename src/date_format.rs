//! Specifies how to serialize a [time::Date] as a "YYYY-MM-DD" string.
//!
//! Use with `#[serde(with = "crate::date_format")]`, or
//! `#[serde(default, with = "crate::date_format::option")]` for optional dates.

use serde::{Deserialize, Deserializer, Serializer};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

/// Date format for transaction dates, e.g. "2026-02-10".
pub const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parse a "YYYY-MM-DD" string.
pub fn parse_date(text: &str) -> Result<Date, time::error::Parse> {
    Date::parse(text, DATE_FORMAT)
}

/// Format `date` as "YYYY-MM-DD".
pub fn format_date(date: Date) -> String {
    date.format(DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let formatted = date.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_date(&s).map_err(|_| {
        serde::de::Error::custom(format!("invalid date \"{s}\", expected YYYY-MM-DD"))
    })
}

pub mod option {
    //! The same format for `Option<Date>`.

    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    pub fn serialize<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => super::serialize(date, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| {
                super::parse_date(&s).map_err(|_| {
                    serde::de::Error::custom(format!("invalid date \"{s}\", expected YYYY-MM-DD"))
                })
            })
            .transpose()
    }
}

#[cfg(test)]
mod date_format_tests {
    use serde::{Deserialize, Serialize};
    use time::{Date, macros::date};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Dated {
        #[serde(with = "crate::date_format")]
        date: Date,
        #[serde(default, with = "crate::date_format::option")]
        until: Option<Date>,
    }

    #[test]
    fn serialise_date() {
        let dated = Dated {
            date: date!(2026 - 02 - 10),
            until: None,
        };

        let json = serde_json::to_string(&dated).unwrap();

        assert_eq!(json, r#"{"date":"2026-02-10","until":null}"#);
    }

    #[test]
    fn deserialise_date_with_missing_option() {
        let dated: Dated = serde_json::from_str(r#"{"date":"2026-02-10"}"#).unwrap();

        assert_eq!(dated.date, date!(2026 - 02 - 10));
        assert_eq!(dated.until, None);
    }

    #[test]
    fn deserialise_bad_date_fails() {
        assert!(serde_json::from_str::<Dated>(r#"{"date":"10/02/2026"}"#).is_err());
        assert!(serde_json::from_str::<Dated>(r#"{"date":"2026-02-30"}"#).is_err());
    }
}
