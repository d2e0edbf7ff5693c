// SPDX-License-Identifier: GPL-3.0-only
use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::repository::{KeyValueEntry, KeyValueRepository, Repository, Retention};

/// Key-value operations guarded by the process liveness context.
pub struct DataService {
    repo: Arc<dyn KeyValueRepository>,
    server_ctx: Context,
}

impl DataService {
    pub fn new(server_ctx: Context, repo: Arc<dyn KeyValueRepository>) -> Self {
        Self { repo, server_ctx }
    }

    fn ensure_live(&self, ctx: &Context) -> Result<()> {
        if self.server_ctx.is_cancelled() || ctx.is_cancelled() {
            return Err(Error::CancelledContext);
        }
        Ok(())
    }

    /// Add a new key-value pair.
    pub async fn add(&self, ctx: &Context, key: &str, value: &str) -> Result<()> {
        self.ensure_live(ctx)?;

        self.repo
            .create(ctx, KeyValueEntry::new(key, value))
            .await
            .map_err(|e| e.context("could not create data entry"))?;
        Ok(())
    }

    /// Value stored under `key`.
    pub async fn get(&self, ctx: &Context, key: &str) -> Result<String> {
        self.ensure_live(ctx)?;

        let entry = self
            .repo
            .by_id(ctx, &key.to_string())
            .await
            .map_err(|e| e.context("could not retrieve data entry"))?;
        Ok(entry.value)
    }

    pub async fn update(&self, ctx: &Context, key: &str, value: &str) -> Result<()> {
        self.ensure_live(ctx)?;

        self.repo
            .update(ctx, KeyValueEntry::new(key, value))
            .await
            .map_err(|e| e.context("could not update data entry"))
    }

    pub async fn delete(&self, ctx: &Context, key: &str) -> Result<()> {
        self.ensure_live(ctx)?;

        self.repo
            .delete(ctx, &key.to_string())
            .await
            .map_err(|e| e.context("could not delete data entry"))
    }

    /// Drop every entry created before `cutoff`.
    pub async fn purge_older_than(&self, ctx: &Context, cutoff: DateTime<Utc>) -> Result<u64> {
        self.ensure_live(ctx)?;

        self.repo
            .delete_older_than(ctx, cutoff)
            .await
            .map_err(|e| e.context("could not purge old data entries"))
    }
}
