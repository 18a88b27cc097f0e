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

//! High-level data types.

use derive_getters::Getters;
use derive_more::Constructor;
use serde::{de::Visitor, Deserialize, Serialize};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Errors caused by invalid values for domain types.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("{0}")]
pub(crate) struct ModelError(pub(crate) String);

/// Result type for this module.
pub(crate) type ModelResult<T> = Result<T, ModelError>;

/// Newtype pattern for the name of a farm.
///
/// The only structural requirement on farm names is that they are not empty.  Anything else,
/// including surrounding whitespace, is taken at face value: uniqueness comparisons are exact
/// and case-sensitive.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct FarmName(String);

impl FarmName {
    /// Creates a new farm name from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(ModelError("Farm name cannot be empty".to_owned()));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the farm name.
    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// A deserialization visitor for a `FarmName`.
struct FarmNameVisitor;

impl Visitor<'_> for FarmNameVisitor {
    type Value = FarmName;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        FarmName::new(v).map_err(|e| E::custom(e.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        FarmName::new(v).map_err(|e| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for FarmName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_string(FarmNameVisitor)
    }
}

/// Newtype pattern for the name of a pond.
///
/// Pond names follow the same rules as farm names but are checked for uniqueness against the
/// collection of ponds only.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub(crate) struct PondName(String);

impl PondName {
    /// Creates a new pond name from an untrusted string `s`, making sure it is valid.
    pub(crate) fn new<S: Into<String>>(s: S) -> ModelResult<Self> {
        let s = s.into();
        if s.is_empty() {
            return Err(ModelError("Pond name cannot be empty".to_owned()));
        }
        Ok(Self(s))
    }

    /// Returns a string view of the pond name.
    pub(crate) fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

/// A deserialization visitor for a `PondName`.
struct PondNameVisitor;

impl Visitor<'_> for PondNameVisitor {
    type Value = PondName;

    fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        formatter.write_str("a string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        PondName::new(v).map_err(|e| E::custom(e.to_string()))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        PondName::new(v).map_err(|e| E::custom(e.to_string()))
    }
}

impl<'de> Deserialize<'de> for PondName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_string(PondNameVisitor)
    }
}

/// A farm, the top-level entity that owns zero or more ponds.
#[derive(Constructor, Getters, Serialize)]
#[cfg_attr(test, derive(Clone, Debug, Deserialize, PartialEq))]
pub(crate) struct Farm {
    /// Identifier assigned by storage at creation time.
    id: i64,

    /// Name of the farm, unique across all farms.
    name: FarmName,
}

/// A pond, which belongs to exactly one farm via `farm_id`.
#[derive(Constructor, Getters, Serialize)]
#[cfg_attr(test, derive(Clone, Debug, Deserialize, PartialEq))]
pub(crate) struct Pond {
    /// Identifier assigned by storage at creation time.
    id: i64,

    /// Name of the pond, unique across all ponds.
    name: PondName,

    /// Identifier of the owning farm.  Only checked against the existing farms when the pond is
    /// written, never again afterwards.
    farm_id: i64,
}

/// One record of an inbound API call.
///
/// Entries are append-only and their storage-assigned identifier is never read back.
#[derive(Constructor, Getters)]
#[cfg_attr(test, derive(Debug, PartialEq))]
pub(crate) struct LogEntry {
    /// Logical endpoint label of the call, such as `POST /farm`.
    endpoint: String,

    /// Caller-reported client identifier; may be empty.
    user_agent: String,

    /// Time at which the call was received.
    created_at: OffsetDateTime,
}

/// Aggregated call counts for a single endpoint label.
#[derive(Constructor, Getters, Serialize)]
#[cfg_attr(test, derive(Debug, Deserialize, PartialEq))]
pub(crate) struct EndpointStatistics {
    /// Total number of calls logged against the endpoint.
    count: i64,

    /// Number of distinct user agent values among those calls.
    unique_user_agent: i64,
}

/// Statistics for every endpoint that has been called at least once, keyed by its logical
/// endpoint label.  Endpoints that were never called do not appear at all.
pub(crate) type Statistics = BTreeMap<String, EndpointStatistics>;
