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

//! Operations on ponds.
//!
//! Writes run their checks in a fixed order: payload validity, then pond name uniqueness, then
//! existence of the referenced farm, and (for upserts) existence of the pond itself last.  When
//! a request violates several conditions at once, the first check in this order wins.

use crate::db::{self, DbError};
use crate::driver::{
    data_not_found, internal, invalid_payload, Driver, DriverError, DriverResult, Upserted,
};
use crate::model::{Pond, PondName};

/// Error for pond names that are already taken, with the message callers observe verbatim.
fn name_conflict() -> DriverError {
    DriverError::AlreadyExists("Pond name already exists".to_owned())
}

/// Error for ponds that reference a farm that does not exist, with the message callers observe
/// verbatim.
fn farm_not_found() -> DriverError {
    DriverError::FarmNotFound("Farm Data Not Found".to_owned())
}

impl Driver {
    /// Creates a new pond named `name` under the farm with identifier `farm_id`.
    pub(crate) async fn create_pond(self, name: String, farm_id: i64) -> DriverResult<Pond> {
        let name = PondName::new(name).map_err(|_| invalid_payload())?;
        let mut ex = self.db.ex();

        let existing = db::get_pond_by_name(&mut ex, &name)
            .await
            .map_err(|e| internal(e, "Failed to create pond"))?;
        if existing.is_some() {
            return Err(name_conflict());
        }

        let farm = db::get_farm_by_id(&mut ex, farm_id)
            .await
            .map_err(|e| internal(e, "Failed to create pond"))?;
        if farm.is_none() {
            return Err(farm_not_found());
        }

        match db::create_pond(&mut ex, &name, farm_id).await {
            Ok(pond) => Ok(pond),
            Err(DbError::AlreadyExists) => Err(name_conflict()),
            Err(e) => Err(internal(e, "Failed to create pond")),
        }
    }

    /// Gets all existing ponds.  An empty collection is reported as missing data, not as an
    /// empty success.
    pub(crate) async fn get_ponds(self) -> DriverResult<Vec<Pond>> {
        let ponds = db::get_ponds(&mut self.db.ex())
            .await
            .map_err(|e| internal(e, "Failed to fetch pond"))?;
        if ponds.is_empty() {
            return Err(data_not_found());
        }
        Ok(ponds)
    }

    /// Gets the pond with identifier `id`.
    pub(crate) async fn get_pond(self, id: i64) -> DriverResult<Pond> {
        match db::get_pond_by_id(&mut self.db.ex(), id)
            .await
            .map_err(|e| internal(e, "Failed to fetch pond"))?
        {
            Some(pond) => Ok(pond),
            None => Err(data_not_found()),
        }
    }

    /// Updates the pond with identifier `id` to be named `name` and belong to farm `farm_id`,
    /// or creates a new pond when no pond with that identifier exists.
    ///
    /// The identifier requested by the caller is never reused for a created pond: storage
    /// assigns a fresh one.  The two outcomes are distinguished in the return value.
    pub(crate) async fn upsert_pond(
        self,
        id: i64,
        name: String,
        farm_id: i64,
    ) -> DriverResult<Upserted<Pond>> {
        let name = PondName::new(name).map_err(|_| invalid_payload())?;
        let mut ex = self.db.ex();

        let existing = db::get_pond_by_name(&mut ex, &name)
            .await
            .map_err(|e| internal(e, "Failed to update pond"))?;
        if let Some(existing) = existing {
            if *existing.id() != id {
                return Err(name_conflict());
            }
        }

        let farm = db::get_farm_by_id(&mut ex, farm_id)
            .await
            .map_err(|e| internal(e, "Failed to update pond"))?;
        if farm.is_none() {
            return Err(farm_not_found());
        }

        match db::get_pond_by_id(&mut ex, id)
            .await
            .map_err(|e| internal(e, "Failed to update pond"))?
        {
            None => match db::create_pond(&mut ex, &name, farm_id).await {
                Ok(pond) => Ok(Upserted::Created(pond)),
                Err(DbError::AlreadyExists) => Err(name_conflict()),
                Err(e) => Err(internal(e, "Failed to create pond")),
            },

            Some(pond) => {
                let id = *pond.id();
                match db::update_pond(&mut ex, id, &name, farm_id).await {
                    Ok(()) => Ok(Upserted::Updated(Pond::new(id, name, farm_id))),
                    Err(DbError::AlreadyExists) => Err(name_conflict()),
                    Err(e) => Err(internal(e, "Failed to update pond")),
                }
            }
        }
    }

    /// Deletes the pond with identifier `id`.
    pub(crate) async fn delete_pond(self, id: i64) -> DriverResult<()> {
        let mut ex = self.db.ex();

        match db::get_pond_by_id(&mut ex, id)
            .await
            .map_err(|e| internal(e, "Failed to delete pond"))?
        {
            None => Err(data_not_found()),
            Some(pond) => match db::delete_pond(&mut ex, *pond.id()).await {
                Ok(()) => Ok(()),
                Err(DbError::NotFound) => Err(data_not_found()),
                Err(e) => Err(internal(e, "Failed to delete pond")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::driver::testutils::*;

    #[tokio::test]
    async fn test_create_pond_ok() {
        let context = TestContext::setup().await;

        let farm = context.driver().create_farm("Farm 1".to_owned()).await.unwrap();

        let pond = context.driver().create_pond("Pond 1".to_owned(), *farm.id()).await.unwrap();
        assert_eq!(1, *pond.id());
        assert_eq!("Pond 1", pond.name().as_str());
        assert_eq!(farm.id(), pond.farm_id());

        assert_eq!(
            Some(pond),
            db::get_pond_by_id(&mut context.ex(), 1).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_create_pond_empty_name() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::InvalidInput("Invalid request payload".to_owned()),
            context.driver().create_pond("".to_owned(), 1).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_create_pond_duplicate_name() {
        let context = TestContext::setup().await;

        let farm = context.driver().create_farm("Farm 1".to_owned()).await.unwrap();
        context.driver().create_pond("Pond 1".to_owned(), *farm.id()).await.unwrap();

        assert_eq!(
            DriverError::AlreadyExists("Pond name already exists".to_owned()),
            context.driver().create_pond("Pond 1".to_owned(), *farm.id()).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_create_pond_farm_not_found() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::FarmNotFound("Farm Data Not Found".to_owned()),
            context.driver().create_pond("Pond 1".to_owned(), 123).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_create_pond_name_conflict_wins_over_missing_farm() {
        let context = TestContext::setup().await;

        let farm = context.driver().create_farm("Farm 1".to_owned()).await.unwrap();
        context.driver().create_pond("Pond 1".to_owned(), *farm.id()).await.unwrap();

        // Both the name and the farm reference are bad; the uniqueness check runs first.
        assert_eq!(
            DriverError::AlreadyExists("Pond name already exists".to_owned()),
            context.driver().create_pond("Pond 1".to_owned(), 123).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_get_ponds_empty_is_not_found() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::NotFound("Data Not Found".to_owned()),
            context.driver().get_ponds().await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_get_ponds_ok() {
        let context = TestContext::setup().await;

        let farm = context.driver().create_farm("Farm 1".to_owned()).await.unwrap();
        let pond1 = context.driver().create_pond("Pond 1".to_owned(), *farm.id()).await.unwrap();
        let pond2 = context.driver().create_pond("Pond 2".to_owned(), *farm.id()).await.unwrap();

        assert_eq!(vec![pond1, pond2], context.driver().get_ponds().await.unwrap());
    }

    #[tokio::test]
    async fn test_get_pond_ok() {
        let context = TestContext::setup().await;

        let farm = context.driver().create_farm("Farm 1".to_owned()).await.unwrap();
        let pond = context.driver().create_pond("Pond 1".to_owned(), *farm.id()).await.unwrap();

        assert_eq!(pond, context.driver().get_pond(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_get_pond_not_found() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::NotFound("Data Not Found".to_owned()),
            context.driver().get_pond(123).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_upsert_pond_missing_id_creates_with_fresh_id() {
        let context = TestContext::setup().await;

        let farm = context.driver().create_farm("Farm 1".to_owned()).await.unwrap();

        match context
            .driver()
            .upsert_pond(123, "Pond 1".to_owned(), *farm.id())
            .await
            .unwrap()
        {
            Upserted::Created(pond) => {
                assert_eq!(1, *pond.id());
                assert_eq!("Pond 1", pond.name().as_str());
                assert_eq!(farm.id(), pond.farm_id());
            }
            Upserted::Updated(pond) => panic!("Must have created a pond, not updated {:?}", pond),
        }

        assert_eq!(None, db::get_pond_by_id(&mut context.ex(), 123).await.unwrap());
    }

    #[tokio::test]
    async fn test_upsert_pond_existing_id_updates_in_place() {
        let context = TestContext::setup().await;

        let farm1 = context.driver().create_farm("Farm 1".to_owned()).await.unwrap();
        let farm2 = context.driver().create_farm("Farm 2".to_owned()).await.unwrap();
        let pond = context.driver().create_pond("Pond 1".to_owned(), *farm1.id()).await.unwrap();

        match context
            .driver()
            .upsert_pond(*pond.id(), "Pond 1 bis".to_owned(), *farm2.id())
            .await
            .unwrap()
        {
            Upserted::Updated(updated) => {
                assert_eq!(pond.id(), updated.id());
                assert_eq!("Pond 1 bis", updated.name().as_str());
                assert_eq!(farm2.id(), updated.farm_id());
            }
            Upserted::Created(pond) => panic!("Must have updated the pond, not created {:?}", pond),
        }
    }

    #[tokio::test]
    async fn test_upsert_pond_name_conflict_with_other_pond() {
        let context = TestContext::setup().await;

        let farm = context.driver().create_farm("Farm 1".to_owned()).await.unwrap();
        context.driver().create_pond("Pond 1".to_owned(), *farm.id()).await.unwrap();
        let pond2 = context.driver().create_pond("Pond 2".to_owned(), *farm.id()).await.unwrap();

        assert_eq!(
            DriverError::AlreadyExists("Pond name already exists".to_owned()),
            context
                .driver()
                .upsert_pond(*pond2.id(), "Pond 1".to_owned(), *farm.id())
                .await
                .unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_upsert_pond_farm_not_found() {
        let context = TestContext::setup().await;

        let farm = context.driver().create_farm("Farm 1".to_owned()).await.unwrap();
        let pond = context.driver().create_pond("Pond 1".to_owned(), *farm.id()).await.unwrap();

        assert_eq!(
            DriverError::FarmNotFound("Farm Data Not Found".to_owned()),
            context
                .driver()
                .upsert_pond(*pond.id(), "Pond 1".to_owned(), 123)
                .await
                .unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_upsert_pond_name_conflict_wins_over_missing_farm() {
        let context = TestContext::setup().await;

        let farm = context.driver().create_farm("Farm 1".to_owned()).await.unwrap();
        context.driver().create_pond("Pond 1".to_owned(), *farm.id()).await.unwrap();
        let pond2 = context.driver().create_pond("Pond 2".to_owned(), *farm.id()).await.unwrap();

        // Both the name and the farm reference are bad; the uniqueness check runs first.
        assert_eq!(
            DriverError::AlreadyExists("Pond name already exists".to_owned()),
            context
                .driver()
                .upsert_pond(*pond2.id(), "Pond 1".to_owned(), 123)
                .await
                .unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_upsert_pond_missing_farm_wins_over_missing_pond() {
        let context = TestContext::setup().await;

        // The pond does not exist either, but the farm check runs before the existence branch.
        assert_eq!(
            DriverError::FarmNotFound("Farm Data Not Found".to_owned()),
            context
                .driver()
                .upsert_pond(123, "Pond 1".to_owned(), 456)
                .await
                .unwrap_err()
        );

        assert_eq!(None, db::get_pond_by_name(&mut context.ex(), &PondName::new("Pond 1").unwrap()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_pond_ok() {
        let context = TestContext::setup().await;

        let farm = context.driver().create_farm("Farm 1".to_owned()).await.unwrap();
        let pond = context.driver().create_pond("Pond 1".to_owned(), *farm.id()).await.unwrap();

        context.driver().delete_pond(*pond.id()).await.unwrap();

        assert_eq!(None, db::get_pond_by_id(&mut context.ex(), *pond.id()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_pond_not_found() {
        let context = TestContext::setup().await;

        assert_eq!(
            DriverError::NotFound("Data Not Found".to_owned()),
            context.driver().delete_pond(123).await.unwrap_err()
        );
    }

    #[tokio::test]
    async fn test_delete_farm_does_not_cascade_to_ponds() {
        let context = TestContext::setup().await;

        let farm = context.driver().create_farm("Farm 1".to_owned()).await.unwrap();
        let pond = context.driver().create_pond("Pond 1".to_owned(), *farm.id()).await.unwrap();

        context.driver().delete_farm(*farm.id()).await.unwrap();

        // The pond is now orphaned but still fully visible.
        assert_eq!(pond, context.driver().get_pond(*pond.id()).await.unwrap());
    }
}
