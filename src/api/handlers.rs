use axum::{
    extract::{rejection::QueryRejection, FromRequest, Query, Request, State},
    http::header,
    response::Html,
    Form, Json,
};
use tracing::debug;
use utoipa::OpenApi;

use super::{
    dto::{ReadingsResponse, SensorReadingDto, SubmissionResponse},
    errors::AppError,
};
use crate::readings::{
    models::{QueryFields, SubmissionFields},
    ReadingService,
};

const INVALID_BODY: &str = "Invalid request body.";

// ---------------------------------------------------------------------------
// Extractors
// ---------------------------------------------------------------------------

/// `POST /data` body, decoded as JSON when the request says so and as a
/// url-encoded form otherwise.
pub struct SubmissionBody(pub SubmissionFields);

impl<S> FromRequest<S> for SubmissionBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/json"));

        let fields = if is_json {
            Json::<SubmissionFields>::from_request(req, state)
                .await
                .map(|Json(f)| f)
                .map_err(|e| {
                    debug!(error = %e, "Rejected JSON submission body");
                    AppError::bad_request(INVALID_BODY)
                })?
        } else {
            Form::<SubmissionFields>::from_request(req, state)
                .await
                .map(|Form(f)| f)
                .map_err(|e| {
                    debug!(error = %e, "Rejected form submission body");
                    AppError::bad_request(INVALID_BODY)
                })?
        };

        Ok(Self(fields))
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Fetch a user's readings, newest first.
///
/// Without `filter` the newest 100 readings are returned. `top10` returns the
/// newest ten, `<N>h` every reading from the last N hours, `*` everything.
#[utoipa::path(
    get,
    path = "/data",
    params(
        ("UID" = String, Query, description = "User identifier"),
        ("filter" = Option<String>, Query, description = "One of top10, 1h, 2h, 4h, 8h, 12h, 24h, *"),
    ),
    responses(
        (status = 200, description = "Matching readings", body = ReadingsResponse),
        (status = 400, description = "Missing or invalid UID or filter"),
        (status = 404, description = "UID does not exist"),
        (status = 500, description = "Identity lookup or store failure"),
    ),
    tag = "readings"
)]
pub async fn get_readings(
    State(service): State<ReadingService>,
    query: Result<Query<QueryFields>, QueryRejection>,
) -> Result<Json<ReadingsResponse>, AppError> {
    let Query(fields) = query.map_err(|e| {
        debug!(error = %e, "Rejected query string");
        AppError::bad_request("Invalid query string.")
    })?;

    let rows = service.query(&fields).await?;
    Ok(Json(ReadingsResponse {
        data: rows.into_iter().map(SensorReadingDto::from).collect(),
    }))
}

/// Store one reading for a user. Accepts JSON or a url-encoded form with
/// `temp`, `TDS`, `pH`, `ORP`, `TUR` and `UID`.
#[utoipa::path(
    post,
    path = "/data",
    request_body = SubmissionFields,
    responses(
        (status = 200, description = "Reading stored", body = SubmissionResponse),
        (status = 400, description = "Missing or invalid values"),
        (status = 404, description = "UID does not exist"),
        (status = 500, description = "Identity lookup or store failure"),
    ),
    tag = "readings"
)]
pub async fn post_reading(
    State(service): State<ReadingService>,
    SubmissionBody(fields): SubmissionBody,
) -> Result<Json<SubmissionResponse>, AppError> {
    let stored = service.submit(&fields).await?;
    Ok(Json(stored.into()))
}

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_PAGE)
}

const INDEX_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <title>HydroSense API</title>
</head>
<body>
  <h1>HydroSense API</h1>
  <p>Water-quality readings per user.</p>
  <ul>
    <li><code>POST /data</code> with <code>temp</code>, <code>TDS</code>, <code>pH</code>,
        <code>ORP</code>, <code>TUR</code>, <code>UID</code></li>
    <li><code>GET /data?UID=&lt;uid&gt;&amp;filter=&lt;top10|1h|2h|4h|8h|12h|24h|*&gt;</code></li>
    <li><a href="/api-docs/openapi.json">OpenAPI document</a></li>
  </ul>
</body>
</html>
"#;

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(get_readings, post_reading, health),
    components(schemas(SensorReadingDto, ReadingsResponse, SubmissionResponse, SubmissionFields)),
    tags(
        (name = "readings", description = "Sensor reading ingestion and queries"),
        (name = "system",   description = "System endpoints"),
    ),
    info(
        title = "HydroSense API",
        version = "0.1.0",
        description = "REST API for per-user water-quality sensor readings"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
