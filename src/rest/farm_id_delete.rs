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

//! API to delete one farm by its identifier.

use crate::driver::Driver;
use crate::rest::{success_no_data, user_agent, Envelope, RestError, RestResult};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

/// Logical endpoint label under which calls to this API are logged.
pub(crate) const ENDPOINT: &str = "DELETE /farm/:id";

/// DELETE handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> RestResult<Json<Envelope<()>>> {
    driver.log_request(ENDPOINT, user_agent(&headers)).await?;

    let id = id.parse::<i64>().map_err(|_| RestError::invalid_param())?;

    driver.delete_farm(id).await?;
    Ok(success_no_data("Farm deleted successfully"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::model::Farm;
    use crate::rest::testutils::*;
    use axum::http;

    fn route(id: &str) -> (http::Method, String) {
        (http::Method::DELETE, format!("/api/farm/{}", id))
    }

    #[tokio::test]
    async fn test_delete_ok() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), (http::Method::POST, "/api/farm/"))
            .send_json(serde_json::json!({"name": "Farm 1"}))
            .await
            .expect_json::<Envelope<Farm>>()
            .await;

        let response = OneShotBuilder::new(context.app(), route("1"))
            .send_empty()
            .await
            .expect_json::<Envelope>()
            .await;
        assert_eq!(200, response.code);
        assert_eq!("success", response.status);
        assert_eq!("Farm deleted successfully", response.message);
        assert!(response.data.is_none());

        assert_eq!(None, db::get_farm_by_id(&mut context.ex(), 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_farm_is_not_found() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.app(), route("123"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::NOT_FOUND)
            .expect_json::<Envelope>()
            .await;
        assert_eq!(404, response.code);
        assert_eq!("Data Not Found", response.message);
    }

    #[tokio::test]
    async fn test_non_integer_id() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.app(), route("5x"))
            .send_empty()
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_json::<Envelope>()
            .await;
        assert_eq!("Invalid request param", response.message);
    }
}
