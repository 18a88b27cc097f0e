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

//! API to update an existing pond or create a new one when the identifier is unknown.

use crate::driver::{Driver, Upserted};
use crate::model::Pond;
use crate::rest::{success, user_agent, Envelope, RestError, RestResult};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

/// Logical endpoint label under which calls to this API are logged.
pub(crate) const ENDPOINT: &str = "PUT /pond/:id";

/// Payload of the pond update request.
#[derive(Deserialize)]
pub(crate) struct PondRequest {
    /// Requested name for the pond.  A missing name binds as empty and fails validation.
    #[serde(default)]
    name: String,

    /// Identifier of the farm the pond belongs to.  A missing identifier binds as zero, which
    /// never matches an existing farm.
    #[serde(default)]
    farm_id: i64,
}

/// PUT handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<PondRequest>, JsonRejection>,
) -> RestResult<Json<Envelope<Pond>>> {
    driver.log_request(ENDPOINT, user_agent(&headers)).await?;

    let id = id.parse::<i64>().map_err(|_| RestError::invalid_param())?;
    let request = payload.map_err(|_| RestError::invalid_payload())?.0;

    // Both outcomes answer with the same status code; the message is what tells callers
    // whether their identifier was honored or a new pond was created.
    match driver.upsert_pond(id, request.name, request.farm_id).await? {
        Upserted::Created(pond) => {
            Ok(success("Data Not Found. New pond created successfully", pond))
        }
        Upserted::Updated(pond) => Ok(success("Pond updated successfully", pond)),
    }
}
