//! In-memory table of departing flights, loaded once from a JSON dump of the
//! airport feed and shared read-only between handlers.

use std::collections::HashSet;
use std::error::Error;
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;
use serde::Deserialize;

use departure_search::flights::{Flight, SearchQuery, SortOrder};

/// Searches return at most this many flights, applied after sorting.
const RESULT_LIMIT: usize = 5;

pub struct FlightsDb {
    flights: Vec<Flight>,
}

#[derive(Deserialize)]
struct FlightsFile {
    flights: Vec<Flight>,
}

impl FlightsDb {
    /// Read a `{"flights": [...]}` dump.
    ///
    /// # Errors
    /// When the file cannot be read or does not match the feed shape.
    pub fn load(path: &Path) -> Result<Self, DataError> {
        let file = File::open(path)?;
        let FlightsFile { flights } = serde_json::from_reader(BufReader::new(file))?;
        info!("loaded {} flights from {}", flights.len(), path.display());
        Ok(Self { flights })
    }

    pub fn new(flights: Vec<Flight>) -> Self {
        Self { flights }
    }

    /// Every airport appearing in the feed, first occurrence first.
    pub fn destinations(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.flights
            .iter()
            .filter(|flight| seen.insert(flight.airport.as_str()))
            .map(|flight| flight.airport.clone())
            .collect()
    }

    /// Flights towards destinations matching the query, ordered by departure.
    ///
    /// The destination matches on case insensitive containment. Flights are
    /// compared by date first and expected departure time within the same
    /// date; equal departures keep their feed order whichever way the sort
    /// runs.
    pub fn search(&self, query: &SearchQuery) -> Vec<Flight> {
        let needle = query.destination.to_lowercase();
        let mut matches: Vec<Flight> = self
            .flights
            .iter()
            .filter(|flight| flight.airport.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            let departures = (a.date, a.expected_time).cmp(&(b.date, b.expected_time));
            match query.order {
                SortOrder::Asc => departures,
                SortOrder::Desc => departures.reverse(),
            }
        });
        info!(
            "search for {:?} ({}) matched {} flights",
            query.destination,
            query.order,
            matches.len()
        );
        matches.truncate(RESULT_LIMIT);
        matches
    }
}

#[derive(Debug)]
pub enum DataError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl From<std::io::Error> for DataError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<serde_json::Error> for DataError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "could not read flight data: {}", error),
            Self::Json(error) => write!(f, "flight data is not valid: {}", error),
        }
    }
}

impl Error for DataError {}
