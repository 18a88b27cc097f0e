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

//! Operations on farms.

use crate::db::{self, DbError};
use crate::driver::{
    data_not_found, internal, invalid_payload, Driver, DriverError, DriverResult, Upserted,
};
use crate::model::{Farm, FarmName};

/// Error for farm names that are already taken, with the message callers observe verbatim.
fn name_conflict() -> DriverError {
    DriverError::AlreadyExists("Farm name already exists".to_owned())
}

impl Driver {
    /// Creates a new farm named `name`.
    ///
    /// The name is validated first and checked for uniqueness second; the storage-level unique
    /// constraint backstops the check when two concurrent creates race each other.
    pub(crate) async fn create_farm(self, name: String) -> DriverResult<Farm> {
        let name = FarmName::new(name).map_err(|_| invalid_payload())?;
        let mut ex = self.db.ex();

        let existing = db::get_farm_by_name(&mut ex, &name)
            .await
            .map_err(|e| internal(e, "Failed to create farm"))?;
        if existing.is_some() {
            return Err(name_conflict());
        }

        match db::create_farm(&mut ex, &name).await {
            Ok(farm) => Ok(farm),
            Err(DbError::AlreadyExists) => Err(name_conflict()),
            Err(e) => Err(internal(e, "Failed to create farm")),
        }
    }

    /// Gets all existing farms.  An empty collection is reported as missing data, not as an
    /// empty success.
    pub(crate) async fn get_farms(self) -> DriverResult<Vec<Farm>> {
        let farms = db::get_farms(&mut self.db.ex())
            .await
            .map_err(|e| internal(e, "Failed to fetch farm"))?;
        if farms.is_empty() {
            return Err(data_not_found());
        }
        Ok(farms)
    }

    /// Gets the farm with identifier `id`.
    pub(crate) async fn get_farm(self, id: i64) -> DriverResult<Farm> {
        match db::get_farm_by_id(&mut self.db.ex(), id)
            .await
            .map_err(|e| internal(e, "Failed to fetch farm"))?
        {
            Some(farm) => Ok(farm),
            None => Err(data_not_found()),
        }
    }

    /// Updates the farm with identifier `id` to be named `name`, or creates a new farm when no
    /// farm with that identifier exists.
    ///
    /// The identifier requested by the caller is never reused for a created farm: storage
    /// assigns a fresh one.  The two outcomes are distinguished in the return value.
    pub(crate) async fn upsert_farm(self, id: i64, name: String) -> DriverResult<Upserted<Farm>> {
        let name = FarmName::new(name).map_err(|_| invalid_payload())?;
        let mut ex = self.db.ex();

        let existing = db::get_farm_by_name(&mut ex, &name)
            .await
            .map_err(|e| internal(e, "Failed to update farm"))?;
        if let Some(existing) = existing {
            if *existing.id() != id {
                return Err(name_conflict());
            }
        }

        match db::get_farm_by_id(&mut ex, id)
            .await
            .map_err(|e| internal(e, "Failed to update farm"))?
        {
            None => match db::create_farm(&mut ex, &name).await {
                Ok(farm) => Ok(Upserted::Created(farm)),
                Err(DbError::AlreadyExists) => Err(name_conflict()),
                Err(e) => Err(internal(e, "Failed to create farm")),
            },

            Some(farm) => {
                let id = *farm.id();
                match db::update_farm(&mut ex, id, &name).await {
                    Ok(()) => Ok(Upserted::Updated(Farm::new(id, name))),
                    Err(DbError::AlreadyExists) => Err(name_conflict()),
                    Err(e) => Err(internal(e, "Failed to update farm")),
                }
            }
        }
    }

    /// Deletes the farm with identifier `id`.  Ponds that referenced the farm are left behind.
    pub(crate) async fn delete_farm(self, id: i64) -> DriverResult<()> {
        let mut ex = self.db.ex();

        match db::get_farm_by_id(&mut ex, id)
            .await
            .map_err(|e| internal(e, "Failed to delete farm"))?
        {
            None => Err(data_not_found()),
            Some(farm) => match db::delete_farm(&mut ex, *farm.id()).await {
                Ok(()) => Ok(()),
                Err(DbError::NotFound) => Err(data_not_found()),
                Err(e) => Err(internal(e, "Failed to delete farm")),
            },
        }
    }
}
