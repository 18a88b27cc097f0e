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

//! API to get all existing ponds.

use crate::driver::Driver;
use crate::model::Pond;
use crate::rest::{success, user_agent, Envelope, RestResult};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

/// Logical endpoint label under which calls to this API are logged.
pub(crate) const ENDPOINT: &str = "GET /pond";

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
) -> RestResult<Json<Envelope<Vec<Pond>>>> {
    driver.log_request(ENDPOINT, user_agent(&headers)).await?;

    let ponds = driver.get_ponds().await?;
    Ok(success("Pond fetched successfully", ponds))
}
