mod config;

use config::Config;
use lambda_http::{
    http::{Method, StatusCode},
    run, service_fn, Body, Error, IntoResponse, Request, RequestExt, Response,
};
use meetinglist_libs::{Endpoint, Response as MeetingResponse};
use tokio::task;
use tracing::{info, warn};

/// Runs one request on the blocking pool; the workbook is read and saved
/// with plain file I/O.
async fn answer(
    endpoint: Endpoint,
    method: &Method,
    body: Vec<u8>,
    action: Option<String>,
) -> Result<MeetingResponse, Error> {
    let result = if *method == Method::POST {
        task::spawn_blocking(move || endpoint.post(&body)).await?
    } else {
        task::spawn_blocking(move || endpoint.get(action.as_deref())).await?
    };

    Ok(result)
}

async fn function_handler(event: Request) -> Result<impl IntoResponse, Error> {
    let config = Config::from_env();
    let endpoint = Endpoint::new(config.workbook, config.tab);

    let action = event
        .query_string_parameters()
        .first("action")
        .map(str::to_string);
    let result = answer(
        endpoint,
        event.method(),
        event.body().as_ref().to_vec(),
        action,
    )
    .await?;

    if result.is_error() {
        warn!(method = %event.method(), "request answered with an error");
    } else {
        info!(method = %event.method(), "request handled");
    }

    // Errors travel in the payload; the status is always 200.
    Ok(Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(&result)?))?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        // CloudWatch shows ANSI escapes verbatim and stamps its own time.
        .with_ansi(false)
        .without_time()
        .init();

    run(service_fn(function_handler)).await
}
