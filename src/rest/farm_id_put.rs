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

//! API to update an existing farm or create a new one when the identifier is unknown.

use crate::driver::{Driver, Upserted};
use crate::model::Farm;
use crate::rest::{success, user_agent, Envelope, RestError, RestResult};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

/// Logical endpoint label under which calls to this API are logged.
pub(crate) const ENDPOINT: &str = "PUT /farm/:id";

/// Payload of the farm update request.
#[derive(Deserialize)]
pub(crate) struct FarmRequest {
    /// Requested name for the farm.  A missing name binds as empty and fails validation.
    #[serde(default)]
    name: String,
}

/// PUT handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<FarmRequest>, JsonRejection>,
) -> RestResult<Json<Envelope<Farm>>> {
    driver.log_request(ENDPOINT, user_agent(&headers)).await?;

    let id = id.parse::<i64>().map_err(|_| RestError::invalid_param())?;
    let request = payload.map_err(|_| RestError::invalid_payload())?.0;

    // Both outcomes answer with the same status code; the message is what tells callers
    // whether their identifier was honored or a new farm was created.
    match driver.upsert_farm(id, request.name).await? {
        Upserted::Created(farm) => {
            Ok(success("Data Not Found. New farm created successfully", farm))
        }
        Upserted::Updated(farm) => Ok(success("Farm updated successfully", farm)),
    }
}
