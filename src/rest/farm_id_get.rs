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

//! API to get one farm by its identifier.

use crate::driver::Driver;
use crate::model::Farm;
use crate::rest::{success, user_agent, Envelope, RestError, RestResult};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

/// Logical endpoint label under which calls to this API are logged.
pub(crate) const ENDPOINT: &str = "GET /farm/:id";

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> RestResult<Json<Envelope<Farm>>> {
    driver.log_request(ENDPOINT, user_agent(&headers)).await?;

    let id = id.parse::<i64>().map_err(|_| RestError::invalid_param())?;

    let farm = driver.get_farm(id).await?;
    Ok(success("Farm fetched successfully", farm))
}
