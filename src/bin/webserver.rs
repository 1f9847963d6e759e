use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;

use log::LevelFilter;
use serde::Serialize;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use warp::http::StatusCode;
use warp::Filter;

use departure_board::db::FlightsDb;
use departure_search::flights::SearchQuery;

#[derive(Serialize)]
struct ErrorReply {
    error: &'static str,
}

fn with_data<D: Send + Sync>(
    db: Arc<D>,
) -> impl Filter<Extract = (Arc<D>,), Error = Infallible> + Clone {
    warp::any().map(move || db.clone())
}

async fn destinations_handler(db: Arc<FlightsDb>) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&db.destinations()))
}

async fn flights_handler(
    query: SearchQuery,
    db: Arc<FlightsDb>,
) -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&db.search(&query)))
}

fn destinations_route(
    db: Arc<FlightsDb>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let cors = warp::cors().allow_any_origin();
    warp::path!("api" / "departures" / "destinations")
        .and(with_data(db))
        .and_then(destinations_handler)
        .with(cors)
}

fn flights_route(
    db: Arc<FlightsDb>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let cors = warp::cors().allow_any_origin();
    warp::path!("api" / "departures" / "flights")
        .and(warp::query::<SearchQuery>())
        .and(with_data(db))
        .and_then(flights_handler)
        .with(cors)
}

/// Rejections become the JSON error bodies the client parser understands.
async fn handle_rejection(rejection: warp::Rejection) -> Result<impl warp::Reply, Infallible> {
    let (error, status) = if rejection.is_not_found() {
        ("Not found", StatusCode::NOT_FOUND)
    } else if rejection.find::<warp::reject::InvalidQuery>().is_some() {
        ("Provide a valid destination", StatusCode::BAD_REQUEST)
    } else {
        log::error!("unhandled rejection: {:?}", rejection);
        (
            "Flight data is not available at this time, please try again later",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
    };
    Ok(warp::reply::with_status(
        warp::reply::json(&ErrorReply { error }),
        status,
    ))
}

#[tokio::main]
async fn main() {
    TermLogger::init(
        LevelFilter::Info,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )
    .expect("logger can only be initialised once");

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8085".to_owned())
        .parse()
        .unwrap();
    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_owned());
    let flights_file =
        std::env::var("FLIGHTS_DATA").unwrap_or_else(|_| "data/flights.json".to_owned());

    let db = Arc::new(FlightsDb::load(Path::new(&flights_file)).unwrap());

    log::info!("starting web server on port {}", port);
    warp::serve(
        warp::fs::dir(static_dir)
            .or(destinations_route(db.clone()))
            .or(flights_route(db))
            .recover(handle_rejection),
    )
    .run(([127, 0, 0, 1], port))
    .await;
}
