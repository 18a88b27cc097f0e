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

//! Entry point to the service.

// Keep these in sync with other top-level files.
#![warn(anonymous_parameters, bad_style, clippy::missing_docs_in_private_items, missing_docs)]
#![warn(unused, unused_extern_crates, unused_import_braces, unused_qualifications)]
#![warn(unsafe_code)]

use aquafarm::db::postgres::{PostgresDb, PostgresOptions};
use aquafarm::db::{init_schema, Db};
use aquafarm::env::get_optional_var;
use aquafarm::serve;
use std::net::Ipv4Addr;

/// Service port used when `AQUAFARM_PORT` is not set.
const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() {
    env_logger::init();

    let port = get_optional_var::<u16>("AQUAFARM", "PORT")
        .expect("Invalid AQUAFARM_PORT in the environment")
        .unwrap_or(DEFAULT_PORT);
    let addr = (Ipv4Addr::LOCALHOST, port);

    let db_opts = PostgresOptions::from_env("AQUAFARM_PGSQL").unwrap();
    let db = Box::from(PostgresDb::connect(db_opts).unwrap());
    init_schema(&mut db.ex()).await.unwrap();

    serve(addr, db).await.unwrap()
}
