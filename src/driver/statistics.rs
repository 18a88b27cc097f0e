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

//! Aggregation of the request log into per-endpoint statistics.

use crate::db;
use crate::driver::{internal, Driver, DriverResult};
use crate::model::Statistics;

impl Driver {
    /// Computes call statistics for every endpoint that appears in the request log.
    ///
    /// This is a full scan over the accumulated logs, recomputed on every call.  The result
    /// only carries endpoints with at least one logged call.
    pub(crate) async fn get_statistics(self) -> DriverResult<Statistics> {
        let mut ex = self.db.ex();

        let endpoints = db::get_distinct_endpoints(&mut ex)
            .await
            .map_err(|e| internal(e, "Failed to fetch statistics"))?;

        let mut statistics = Statistics::new();
        for endpoint in endpoints {
            let endpoint_statistics = db::get_endpoint_statistics(&mut ex, &endpoint)
                .await
                .map_err(|e| internal(e, "Failed to fetch statistics"))?;
            statistics.insert(endpoint, endpoint_statistics);
        }
        Ok(statistics)
    }
}
