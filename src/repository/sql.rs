// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::repository::clock::{Clock, SystemClock};
use crate::repository::traits::{Repository, Retention};
use crate::store::{Entity, StorageEngine, Timestamped};

/// Repository for any entity family, backed by one storage engine.
///
/// Reads hold the lock in shared mode and writes in exclusive mode for the
/// whole store call, so the lookup-then-write of `update` and `delete` cannot
/// interleave with another writer of the same family.
pub struct SqlRepository<E> {
    engine: StorageEngine,
    lock: RwLock<()>,
    clock: Arc<dyn Clock>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> SqlRepository<E> {
    /// Wrap `engine`, creating or completing the entity's table first.
    pub async fn new(engine: StorageEngine) -> Result<Self> {
        Self::with_clock(engine, Arc::new(SystemClock)).await
    }

    pub async fn with_clock(engine: StorageEngine, clock: Arc<dyn Clock>) -> Result<Self> {
        engine.ensure_schema::<E>().await?;
        Ok(Self {
            engine,
            lock: RwLock::new(()),
            clock,
            _entity: PhantomData,
        })
    }

    #[cfg(test)]
    pub fn engine(&self) -> &StorageEngine {
        &self.engine
    }

    /// Close the underlying engine once every in-flight call has finished.
    pub async fn close(&self) {
        let _guard = self.lock.write().await;
        self.engine.close().await;
    }

    async fn existing(&self, ctx: &Context, id: &E::Id) -> Result<E> {
        ctx.run(self.engine.fetch_by_id::<E>(id))
            .await?
            .ok_or(Error::NotFound)
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for SqlRepository<E> {
    async fn find_all(&self, ctx: &Context) -> Result<Vec<E>> {
        let _guard = self.lock.read().await;
        ctx.run(self.engine.fetch_all::<E>()).await
    }

    async fn by_id(&self, ctx: &Context, id: &E::Id) -> Result<E> {
        let _guard = self.lock.read().await;
        self.existing(ctx, id).await
    }

    async fn create(&self, ctx: &Context, mut entity: E) -> Result<E> {
        if !E::is_addressable(&entity.id()) {
            return Err(Error::InvalidInput(format!("{} item has an empty identifier", E::NAME)));
        }

        let _guard = self.lock.write().await;
        entity.stamp_created(self.clock.now());
        let rowid = ctx.run(self.engine.insert(&entity)).await?;
        entity.assign_id(rowid);

        info!(entity = E::NAME, id = %entity.id(), "Created item");
        Ok(entity)
    }

    async fn update(&self, ctx: &Context, mut entity: E) -> Result<()> {
        if !E::is_addressable(&entity.id()) {
            return Err(Error::NotFound);
        }

        let _guard = self.lock.write().await;
        let existing = self.existing(ctx, &entity.id()).await?;
        entity.stamp_updated(&existing, self.clock.now());
        ctx.run(self.engine.replace(&entity)).await?;

        debug!(entity = E::NAME, id = %entity.id(), "Updated item");
        Ok(())
    }

    async fn delete(&self, ctx: &Context, id: &E::Id) -> Result<()> {
        if !E::is_addressable(id) {
            return Err(Error::NotFound);
        }

        let _guard = self.lock.write().await;
        self.existing(ctx, id).await?;
        ctx.run(self.engine.delete_by_id::<E>(id)).await?;

        info!(entity = E::NAME, id = %id, "Deleted item");
        Ok(())
    }
}

#[async_trait]
impl<E: Timestamped> Retention for SqlRepository<E> {
    async fn delete_older_than(&self, ctx: &Context, cutoff: DateTime<Utc>) -> Result<u64> {
        let _guard = self.lock.write().await;
        let deleted = ctx.run(self.engine.delete_before::<E>(cutoff)).await?;

        info!(entity = E::NAME, deleted, cutoff = %cutoff, "Deleted items older than cutoff");
        Ok(deleted)
    }
}
