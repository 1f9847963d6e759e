//! Client side parsing of the departures API replies: the step between a
//! byte transport and the typed stores. Transports themselves stay out of
//! the core, anything which can produce the reply bytes can feed these.

use serde::Deserialize;

use departure_search::flights::Flight;

use crate::store::LoadError;

#[derive(Deserialize)]
struct ErrorReply {
    error: String,
}

/// Parse a reply from the destinations endpoint.
pub fn parse_destinations(body: &[u8]) -> Result<Vec<String>, LoadError> {
    serde_json::from_slice(body).map_err(LoadError::from)
}

/// Parse a reply from the flights endpoint.
///
/// A reply carrying an `error` field counts as a failure even when the
/// transport reported success; its message is surfaced verbatim.
pub fn parse_flights(body: &[u8]) -> Result<Vec<Flight>, LoadError> {
    if let Ok(ErrorReply { error }) = serde_json::from_slice(body) {
        return Err(LoadError::Service(error));
    }
    serde_json::from_slice(body).map_err(LoadError::from)
}
