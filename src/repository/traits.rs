// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::context::Context;
use crate::error::Result;
use crate::repository::models::{KeyValueEntry, Location};
use crate::store::Entity;

/// Storage capability for one entity family.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// Every stored row, soft-deleted or not
    async fn find_all(&self, ctx: &Context) -> Result<Vec<E>>;

    /// Look up a row; `NotFound` when absent
    async fn by_id(&self, ctx: &Context, id: &E::Id) -> Result<E>;

    /// Insert a new row and return it as stored
    async fn create(&self, ctx: &Context, entity: E) -> Result<E>;

    /// Replace the mutable fields of an existing row; `NotFound` when absent
    async fn update(&self, ctx: &Context, entity: E) -> Result<()>;

    /// Hard-delete an existing row; `NotFound` when absent
    async fn delete(&self, ctx: &Context, id: &E::Id) -> Result<()>;
}

#[async_trait]
pub trait Retention: Send + Sync {
    /// Delete every row created before `cutoff`, returning how many went.
    async fn delete_older_than(&self, ctx: &Context, cutoff: DateTime<Utc>) -> Result<u64>;
}

pub trait KeyValueRepository: Repository<KeyValueEntry> + Retention {}

impl<T: Repository<KeyValueEntry> + Retention> KeyValueRepository for T {}

pub trait LocationRepository: Repository<Location> {}

impl<T: Repository<Location>> LocationRepository for T {}
