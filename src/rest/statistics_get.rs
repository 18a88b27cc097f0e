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

//! API to get per-endpoint call statistics.

use crate::driver::Driver;
use crate::model::Statistics;
use crate::rest::{success, user_agent, Envelope, RestResult};
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;

/// Logical endpoint label under which calls to this API are logged.
///
/// The call is logged before the aggregation runs, so this label always appears in the
/// endpoint's own report.
pub(crate) const ENDPOINT: &str = "GET /log";

/// GET handler for this API.
pub(crate) async fn handler(
    State(driver): State<Driver>,
    headers: HeaderMap,
) -> RestResult<Json<Envelope<Statistics>>> {
    driver.log_request(ENDPOINT, user_agent(&headers)).await?;

    let statistics = driver.get_statistics().await?;
    Ok(success("Statistic fetched successfully", statistics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EndpointStatistics;
    use crate::rest::{farm_get, farm_post};
    use crate::rest::testutils::*;
    use axum::http;

    fn route() -> (http::Method, String) {
        (http::Method::GET, "/api/statistics/".to_owned())
    }

    #[tokio::test]
    async fn test_reports_its_own_call() {
        let context = TestContext::setup().await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_json::<Envelope<Statistics>>()
            .await;
        assert_eq!(200, response.code);
        assert_eq!("success", response.status);
        assert_eq!("Statistic fetched successfully", response.message);

        let statistics = response.data.unwrap();
        assert_eq!(1, statistics.len());
        assert_eq!(Some(&EndpointStatistics::new(1, 1)), statistics.get(ENDPOINT));
    }

    #[tokio::test]
    async fn test_counts_calls_and_distinct_user_agents() {
        let context = TestContext::setup().await;

        // Two creations from different clients, one of which fails validation: failed calls
        // are counted all the same.
        OneShotBuilder::new(context.app(), (http::Method::POST, "/api/farm/"))
            .with_header("user-agent", "agent-1")
            .send_json(serde_json::json!({"name": "Farm 1"}))
            .await
            .expect_json::<Envelope<crate::model::Farm>>()
            .await;
        OneShotBuilder::new(context.app(), (http::Method::POST, "/api/farm/"))
            .with_header("user-agent", "agent-2")
            .send_json(serde_json::json!({"name": ""}))
            .await
            .expect_status(http::StatusCode::BAD_REQUEST)
            .expect_json::<Envelope>()
            .await;
        OneShotBuilder::new(context.app(), (http::Method::GET, "/api/farm/"))
            .with_header("user-agent", "agent-1")
            .send_empty()
            .await
            .expect_json::<Envelope<Vec<crate::model::Farm>>>()
            .await;

        let response = OneShotBuilder::new(context.app(), route())
            .with_header("user-agent", "agent-1")
            .send_empty()
            .await
            .expect_json::<Envelope<Statistics>>()
            .await;
        let statistics = response.data.unwrap();

        assert_eq!(3, statistics.len());
        assert_eq!(
            Some(&EndpointStatistics::new(2, 2)),
            statistics.get(farm_post::ENDPOINT)
        );
        assert_eq!(
            Some(&EndpointStatistics::new(1, 1)),
            statistics.get(farm_get::ENDPOINT)
        );
        assert_eq!(Some(&EndpointStatistics::new(1, 1)), statistics.get(ENDPOINT));

        // Endpoints that were never called are absent, not present with zero counts.
        assert_eq!(None, statistics.get("DELETE /farm/:id"));
    }

    #[tokio::test]
    async fn test_repeated_calls_accumulate() {
        let context = TestContext::setup().await;

        OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_json::<Envelope<Statistics>>()
            .await;

        let response = OneShotBuilder::new(context.app(), route())
            .send_empty()
            .await
            .expect_json::<Envelope<Statistics>>()
            .await;
        let statistics = response.data.unwrap();

        // Requests without a user agent all count as the same, empty client identifier.
        assert_eq!(Some(&EndpointStatistics::new(2, 1)), statistics.get(ENDPOINT));
    }
}
