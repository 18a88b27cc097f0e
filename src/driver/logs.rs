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

//! Recording of inbound API calls.

use crate::db;
use crate::driver::{internal, Driver, DriverResult};
use crate::model::LogEntry;

impl Driver {
    /// Records one inbound API call under the logical `endpoint` label along with the caller's
    /// self-reported `user_agent`.
    ///
    /// Handlers call this before running any other logic, so a failure here aborts the whole
    /// request.
    pub(crate) async fn log_request(&self, endpoint: &str, user_agent: &str) -> DriverResult<()> {
        let entry =
            LogEntry::new(endpoint.to_owned(), user_agent.to_owned(), self.clock.now_utc());
        db::create_log(&mut self.db.ex(), &entry)
            .await
            .map_err(|e| internal(e, "Failed to create log"))
    }
}
