// Aquafarm
// Copyright 2024 Julio Merino
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not
// use this file except in compliance with the License.  You may obtain a copy
// of the License at:
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.  See the
// License for the specific language governing permissions and limitations
// under the License.

//! Entry point to the REST server.
//!
//! Every API lives in its own `.rs` file, using a name like `<entity>_<method>.rs`.  This may
//! seem overkill, but putting every API in its own file makes it easy to ensure all the
//! integration tests for the given API truly belong to that API.
//!
//! Each handler follows the same sequence: record the call in the request log first (a failure
//! there aborts the request), then parse path parameters and bind the payload, then delegate to
//! the driver.  Logging before parsing means even malformed requests leave a log row behind.
//!
//! All responses share the envelope `{code, status, message, data?}`, where `code` mirrors the
//! HTTP status code and `data` is only present on successful responses that carry a resource.

use crate::driver::{Driver, DriverError};
use axum::http::header::USER_AGENT;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::{Json, Router};
#[cfg(test)]
use serde::Deserialize;
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

mod farm_get;
mod farm_id_delete;
mod farm_id_get;
mod farm_id_put;
mod farm_post;
mod pond_get;
mod pond_id_delete;
mod pond_id_get;
mod pond_id_put;
mod pond_post;
mod statistics_get;
#[cfg(test)]
mod testutils;

/// Frontend errors.  These are the errors that are visible to the user on failed requests.
#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum RestError {
    /// Indicates a uniqueness conflict with an existing resource.
    #[error("{0}")]
    Conflict(String),

    /// Catch-all error type for all unexpected errors.
    #[error("{0}")]
    InternalError(String),

    /// Indicates an error in the contents of the request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Indicates that a requested entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Indicates that the request did not match any route.  Rendered with a status distinct
    /// from `NotFound` so that callers can tell a missing route from a missing resource.
    #[error("Endpoint not found!")]
    UnknownEndpoint,
}

impl RestError {
    /// Error for request bodies that cannot be bound to the expected payload.
    fn invalid_payload() -> RestError {
        RestError::InvalidRequest("Invalid request payload".to_owned())
    }

    /// Error for path parameters that cannot be parsed.
    fn invalid_param() -> RestError {
        RestError::InvalidRequest("Invalid request param".to_owned())
    }
}

impl From<DriverError> for RestError {
    fn from(e: DriverError) -> Self {
        match e {
            DriverError::AlreadyExists(_) => RestError::Conflict(e.to_string()),
            DriverError::BackendError(_) => RestError::InternalError(e.to_string()),
            DriverError::FarmNotFound(_) => RestError::NotFound(e.to_string()),
            DriverError::InvalidInput(_) => RestError::InvalidRequest(e.to_string()),
            DriverError::NotFound(_) => RestError::NotFound(e.to_string()),
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            RestError::Conflict(_) => StatusCode::CONFLICT,
            RestError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RestError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RestError::NotFound(_) => StatusCode::NOT_FOUND,
            RestError::UnknownEndpoint => StatusCode::SERVICE_UNAVAILABLE,
        };

        let response = Envelope::<()> {
            code: status.as_u16(),
            status: "error".to_owned(),
            message: self.to_string(),
            data: None,
        };
        (status, Json(response)).into_response()
    }
}

/// Result type for this module.
pub(crate) type RestResult<T> = Result<T, RestError>;

/// Uniform envelope for all API responses.
#[derive(Serialize)]
#[cfg_attr(test, derive(Debug, Deserialize, PartialEq))]
#[cfg_attr(test, serde(bound(deserialize = "T: Deserialize<'de>")))]
pub(crate) struct Envelope<T = ()> {
    /// Numeric mirror of the HTTP status code of the response.
    code: u16,

    /// Either `"success"` or `"error"`.
    status: String,

    /// Fixed human-readable outcome message.
    message: String,

    /// Resource payload, present only on successful responses that carry one.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(test, serde(default))]
    data: Option<T>,
}

/// Builds the envelope for a successful response that carries `data`.
fn success<T: Serialize>(message: &str, data: T) -> Json<Envelope<T>> {
    Json(Envelope {
        code: StatusCode::OK.as_u16(),
        status: "success".to_owned(),
        message: message.to_owned(),
        data: Some(data),
    })
}

/// Builds the envelope for a successful response with no resource payload.
fn success_no_data(message: &str) -> Json<Envelope<()>> {
    Json(Envelope {
        code: StatusCode::OK.as_u16(),
        status: "success".to_owned(),
        message: message.to_owned(),
        data: None,
    })
}

/// Extracts the caller-reported user agent from the request headers, defaulting to an empty
/// string when the header is absent or not valid text.
fn user_agent(headers: &HeaderMap) -> &str {
    headers.get(USER_AGENT).and_then(|value| value.to_str().ok()).unwrap_or("")
}

/// Handler for requests that do not resolve to any route.
async fn unknown_endpoint() -> RestError {
    RestError::UnknownEndpoint
}

/// Creates the router for the application.
pub(crate) fn app(driver: Driver) -> Router {
    use axum::routing::{get, post};

    let farms = Router::new()
        .route("/", post(farm_post::handler).get(farm_get::handler))
        .route(
            "/:id",
            get(farm_id_get::handler).put(farm_id_put::handler).delete(farm_id_delete::handler),
        );
    let ponds = Router::new()
        .route("/", post(pond_post::handler).get(pond_get::handler))
        .route(
            "/:id",
            get(pond_id_get::handler).put(pond_id_put::handler).delete(pond_id_delete::handler),
        );
    let statistics = Router::new().route("/", get(statistics_get::handler));

    Router::new()
        .nest("/api/farm", farms)
        .nest("/api/pond", ponds)
        .nest("/api/statistics", statistics)
        .fallback(unknown_endpoint)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .with_state(driver)
}
