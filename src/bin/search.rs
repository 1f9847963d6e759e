//! Runs one departures search against the local data file, through the same
//! stores, form and reply parsing the web UI uses.
//!
//! ```text
//! FLIGHTS_DATA=data/flights.json search <destination> [asc|desc]
//! ```

use std::path::Path;
use std::rc::Rc;

use enclose::enclose;
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use departure_board::api;
use departure_board::db::FlightsDb;
use departure_board::search_form::{SearchForm, SuggestionPanel};
use departure_board::store::{AsyncStore, LoadError};
use departure_board::subscription::Registry;
use departure_search::flights::{date_heading, group_by_date, SearchQuery, SortOrder};

fn main() {
    TermLogger::init(
        LevelFilter::Warn,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .expect("logger can only be initialised once");

    let destination = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "Paris".to_owned());
    let order: SortOrder = std::env::args()
        .nth(2)
        .map(|arg| arg.parse().expect("order should be asc or desc"))
        .unwrap_or_default();
    let flights_file =
        std::env::var("FLIGHTS_DATA").unwrap_or_else(|_| "data/flights.json".to_owned());

    let db = Rc::new(FlightsDb::load(Path::new(&flights_file)).unwrap());

    // in-process fetchers: the db reply is serialised and parsed exactly as
    // a browser client would parse the endpoint bytes
    let destinations = AsyncStore::new(enclose!((db) move |()| {
        let db = Rc::clone(&db);
        async move {
            let body =
                serde_json::to_vec(&db.destinations()).map_err(|e| LoadError::Fetch(e.to_string()))?;
            api::parse_destinations(&body)
        }
    }));
    let flights = AsyncStore::new(enclose!((db) move |query: SearchQuery| {
        let db = Rc::clone(&db);
        async move {
            let body =
                serde_json::to_vec(&db.search(&query)).map_err(|e| LoadError::Fetch(e.to_string()))?;
            api::parse_flights(&body)
        }
    }));

    let form = SearchForm::new(destinations, flights, Registry::new());
    futures::executor::block_on(run(&form, &destination, order));
}

async fn run(form: &SearchForm, destination: &str, order: SortOrder) {
    form.focus().await;
    if let Some(error) = form.destinations.error() {
        eprintln!("could not load destinations: {}", error);
    }

    form.input(destination);
    match form.suggestions() {
        SuggestionPanel::Ready { typed, ranked } => {
            println!("Suggestions for '{}':", destination);
            for suggestion in typed.iter().chain(ranked.iter()) {
                println!("  {}", suggestion);
            }
        }
        SuggestionPanel::Loading => println!("Loading destinations..."),
        SuggestionPanel::Hidden => {}
    }

    form.submit().await;
    if order != SortOrder::default() {
        form.set_order(order).await;
    }

    if let Some(error) = form.flights.error() {
        eprintln!("{}", error);
        return;
    }
    match form.flights.data() {
        Some(flights) if !flights.is_empty() => {
            for group in group_by_date(&flights) {
                println!("\n{}", date_heading(group.date));
                for flight in group.flights {
                    let delay = if flight.is_delayed() {
                        format!(" (was {})", flight.original_time.format("%H:%M"))
                    } else {
                        String::new()
                    };
                    println!(
                        "  {}{} {} {}",
                        flight.expected_time.format("%H:%M"),
                        delay,
                        flight.airport,
                        flight.flight_number
                    );
                }
            }
        }
        _ => println!("No flights found, try another destination."),
    }
}
