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

//! API to create a new farm.

use crate::driver::Driver;
use crate::model::Farm;
use crate::rest::{success, user_agent, Envelope, RestError, RestResult};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

/// Logical endpoint label under which calls to this API are logged.
pub(crate) const ENDPOINT: &str = "POST /farm";

/// Payload of the farm creation request.
#[derive(Deserialize)]
pub(crate) struct FarmRequest {
    /// Requested name for the farm.  A missing name binds as empty and fails validation.
    #[serde(default)]
    name: String,
}

/// POST handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
    payload: Result<Json<FarmRequest>, JsonRejection>,
) -> RestResult<Json<Envelope<Farm>>> {
    driver.log_request(ENDPOINT, user_agent(&headers)).await?;

    let request = payload.map_err(|_| RestError::invalid_payload())?.0;

    let farm = driver.create_farm(request.name).await?;
    Ok(success("New farm created successfully", farm))
}
