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

//! Utilities to support testing of the business layer.

use crate::clocks::testutils::{utc_datetime, SettableClock};
use crate::clocks::Clock;
use crate::db::{self, Db, Executor};
use crate::driver::Driver;
use std::sync::Arc;

/// State of a running test.
pub(crate) struct TestContext {
    /// The driver under test.
    driver: Driver,

    /// Direct access to the database backing `driver`.
    db: Arc<dyn Db + Send + Sync>,
}

impl TestContext {
    /// Initializes the in-memory test database and the driver under test.
    pub(crate) async fn setup() -> TestContext {
        let db: Arc<dyn Db + Send + Sync> = Arc::from(db::sqlite::testutils::setup().await);
        db::init_schema(&mut db.ex()).await.unwrap();

        let clock: Arc<dyn Clock + Send + Sync> =
            Arc::from(SettableClock::new(utc_datetime(2023, 6, 12, 8, 30, 0)));
        let driver = Driver::new(db.clone(), clock);
        TestContext { driver, db }
    }

    /// Gets a clone of the driver under test.
    pub(crate) fn driver(&self) -> Driver {
        self.driver.clone()
    }

    /// Gets the database that backs the driver under test.
    pub(crate) fn db(&self) -> &Arc<dyn Db + Send + Sync> {
        &self.db
    }

    /// Obtains direct executor access to the underlying database.
    pub(crate) fn ex(&self) -> Executor {
        self.db.ex()
    }
}
