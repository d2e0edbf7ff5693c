// SPDX-License-Identifier: GPL-3.0-only
use std::sync::Arc;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::repository::{Location, LocationRepository, Repository};

/// Location catalog operations guarded by the process liveness context.
pub struct LocationService {
    repo: Arc<dyn LocationRepository>,
    server_ctx: Context,
}

impl LocationService {
    pub fn new(server_ctx: Context, repo: Arc<dyn LocationRepository>) -> Self {
        Self { repo, server_ctx }
    }

    fn ensure_live(&self, ctx: &Context) -> Result<()> {
        if self.server_ctx.is_cancelled() || ctx.is_cancelled() {
            return Err(Error::CancelledContext);
        }
        Ok(())
    }

    /// Store a new location; the returned copy carries the assigned id.
    pub async fn add(&self, ctx: &Context, location: Location) -> Result<Location> {
        self.ensure_live(ctx)?;

        self.repo
            .create(ctx, location)
            .await
            .map_err(|e| e.context("could not create Location entry"))
    }

    pub async fn get(&self, ctx: &Context, id: i64) -> Result<Location> {
        self.ensure_live(ctx)?;

        self.repo
            .by_id(ctx, &id)
            .await
            .map_err(|e| e.context("could not retrieve Location entry"))
    }

    pub async fn get_all(&self, ctx: &Context) -> Result<Vec<Location>> {
        self.ensure_live(ctx)?;

        self.repo
            .find_all(ctx)
            .await
            .map_err(|e| e.context("could not retrieve locations"))
    }

    pub async fn update(&self, ctx: &Context, location: Location) -> Result<()> {
        self.ensure_live(ctx)?;

        self.repo
            .update(ctx, location)
            .await
            .map_err(|e| e.context("could not update Location entry"))
    }

    pub async fn delete(&self, ctx: &Context, id: i64) -> Result<()> {
        self.ensure_live(ctx)?;

        self.repo
            .delete(ctx, &id)
            .await
            .map_err(|e| e.context("could not delete Location entry"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::test_helpers::setup_location_repository;

    async fn setup() -> (LocationService, crate::context::CancelHandle) {
        let repo = Arc::new(setup_location_repository().await);
        let (server_ctx, handle) = Context::background().with_cancel();
        (LocationService::new(server_ctx, repo), handle)
    }

    fn place(name: &str) -> Location {
        Location {
            latitude: 45.0,
            longitude: 25.0,
            location_name: name.to_string(),
            ..Location::default()
        }
    }

    #[tokio::test]
    async fn test_add_get_and_list() {
        let (service, _handle) = setup().await;
        let ctx = Context::background();

        let first = service.add(&ctx, place("Brasov")).await.unwrap();
        service.add(&ctx, place("Sibiu")).await.unwrap();

        assert_eq!(service.get(&ctx, first.id).await.unwrap().location_name, "Brasov");
        assert_eq!(service.get_all(&ctx).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_then_delete() {
        let (service, _handle) = setup().await;
        let ctx = Context::background();
        let mut created = service.add(&ctx, place("draft")).await.unwrap();

        created.image = "data:image/png;base64,AAAA".to_string();
        service.update(&ctx, created.clone()).await.unwrap();
        assert_eq!(service.get(&ctx, created.id).await.unwrap(), created);

        service.delete(&ctx, created.id).await.unwrap();
        let err = service.get(&ctx, created.id).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.to_string().starts_with("could not retrieve Location entry"));
    }

    #[tokio::test]
    async fn test_missing_location_is_not_found() {
        let (service, _handle) = setup().await;
        let ctx = Context::background();

        let err = service.get(&ctx, 4242).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = service.delete(&ctx, 4242).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_cancelled_server_context_short_circuits_everything() {
        let (service, handle) = setup().await;
        let ctx = Context::background();
        let created = service.add(&ctx, place("kept")).await.unwrap();

        handle.cancel();

        let kinds = [
            service.add(&ctx, place("new")).await.unwrap_err().kind(),
            service.get(&ctx, created.id).await.unwrap_err().kind(),
            service.get_all(&ctx).await.unwrap_err().kind(),
            service.update(&ctx, created.clone()).await.unwrap_err().kind(),
            service.delete(&ctx, created.id).await.unwrap_err().kind(),
        ];
        assert!(kinds.iter().all(|k| *k == ErrorKind::CancelledContext));

        let (fresh, _fresh_handle) = {
            let (server_ctx, handle) = Context::background().with_cancel();
            (LocationService::new(server_ctx, Arc::clone(&service.repo)), handle)
        };
        let stored = fresh.get_all(&ctx).await.unwrap();
        assert_eq!(stored, vec![created]);
    }
}
