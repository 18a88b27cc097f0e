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

//! Business logic for the service.
//!
//! Operations that perform more than one check run those checks in a fixed, documented order,
//! because the order decides which error the caller sees when several conditions are violated
//! at once.  The error messages produced here are the exact strings rendered to API callers;
//! details of backend failures are logged and never propagated.

use crate::clocks::Clock;
use crate::db::{Db, DbError};
use log::error;
use std::sync::Arc;

mod farms;
mod logs;
mod ponds;
mod statistics;
#[cfg(test)]
pub(crate) mod testutils;

/// Business logic errors.  These errors encompass backend and logical errors.
#[derive(Debug, PartialEq, thiserror::Error)]
pub(crate) enum DriverError {
    /// Indicates that a request to create an entry failed because it already exists.
    #[error("{0}")]
    AlreadyExists(String),

    /// Catch-all error type for unexpected backend errors.
    #[error("{0}")]
    BackendError(String),

    /// Indicates that the farm referenced by a pond does not exist.
    #[error("{0}")]
    FarmNotFound(String),

    /// Indicates an error in the input data.
    #[error("{0}")]
    InvalidInput(String),

    /// Indicates that a requested entry does not exist.
    #[error("{0}")]
    NotFound(String),
}

/// Result type for this module.
pub(crate) type DriverResult<T> = Result<T, DriverError>;

/// Outcome of an update-or-insert operation.
#[cfg_attr(test, derive(Debug))]
pub(crate) enum Upserted<T> {
    /// No entity with the requested identifier existed, so a new one was created with a fresh
    /// storage-assigned identifier.
    Created(T),

    /// The entity existed and was updated in place, keeping its identifier.
    Updated(T),
}

/// Error for payloads that fail validation, with the message callers observe verbatim.
pub(super) fn invalid_payload() -> DriverError {
    DriverError::InvalidInput("Invalid request payload".to_owned())
}

/// Error for entities that are absent, with the message callers observe verbatim.
pub(super) fn data_not_found() -> DriverError {
    DriverError::NotFound("Data Not Found".to_owned())
}

/// Replaces a backend error `e` with the public `message`, logging the original details.
pub(super) fn internal(e: DbError, message: &str) -> DriverError {
    error!("{}: {}", message, e);
    DriverError::BackendError(message.to_owned())
}

/// Business logic.
///
/// The public operations exposed by the driver are all "one shot" and consume the driver, which
/// minimizes the possibility of mixing two business operations in one request.  The exception
/// is `log_request`, which only borrows the driver so that every handler can record its call
/// before running its business operation.
#[derive(Clone)]
pub(crate) struct Driver {
    /// The database that the driver uses for persistence.
    db: Arc<dyn Db + Send + Sync>,

    /// Clock instance to obtain the current time.
    clock: Arc<dyn Clock + Send + Sync>,
}

impl Driver {
    /// Creates a new driver backed by the given injected components.
    pub(crate) fn new(db: Arc<dyn Db + Send + Sync>, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self { db, clock }
    }
}
