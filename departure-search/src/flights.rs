use std::error::Error;
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Sort direction for a departures search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::Asc
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        })
    }
}

impl std::str::FromStr for SortOrder {
    type Err = ParseOrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ParseOrderError),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOrderError;

impl fmt::Display for ParseOrderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("sort order should be \"asc\" or \"desc\"")
    }
}

impl Error for ParseOrderError {}

/// A departures search as entered in the search form: the typed destination
/// and the requested ordering. `order` defaults to ascending when absent,
/// which is also how the query string omits it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub destination: String,
    #[serde(default)]
    pub order: SortOrder,
}

/// A departing flight as published by the airport feed.
///
/// The feed keeps dates without a time component, times as plain `"HH:MM"`
/// strings and stringifies `score`; the serde representation reproduces that
/// shape exactly so server replies round trip through the client parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    pub flight_identifier: String,
    pub flight_number: String,
    pub airport: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub expected_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub original_time: NaiveTime,
    pub url: String,
    #[serde(with = "stringified")]
    pub score: f64,
}

impl Flight {
    /// The expected departure no longer matches the published schedule.
    pub fn is_delayed(&self) -> bool {
        self.expected_time != self.original_time
    }
}

/// `"HH:MM"` times as used by the feed, chrono would otherwise expect seconds.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT).map_err(de::Error::custom)
    }
}

/// The feed publishes `score` as a decimal string.
mod stringified {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}

/// Flights sharing a calendar date, in display order.
#[derive(Debug, PartialEq)]
pub struct DateGroup<'a> {
    pub date: NaiveDate,
    pub flights: Vec<&'a Flight>,
}

/// Group a search result by calendar date for display. Groups appear in the
/// order their date is first encountered in `flights`.
pub fn group_by_date(flights: &[Flight]) -> Vec<DateGroup<'_>> {
    let mut groups: Vec<DateGroup<'_>> = Vec::new();
    for flight in flights {
        match groups.iter_mut().find(|group| group.date == flight.date) {
            Some(group) => group.flights.push(flight),
            None => groups.push(DateGroup {
                date: flight.date,
                flights: vec![flight],
            }),
        }
    }
    groups
}

/// Heading for a group of flights, eg. "Monday 21 February".
pub fn date_heading(date: NaiveDate) -> String {
    date.format("%A %-d %B").to_string()
}
