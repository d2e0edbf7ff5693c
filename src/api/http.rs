// SPDX-License-Identifier: GPL-3.0-only
use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::api::handlers::{ApiError, ApiHandlers, ApiResult};
use crate::api::middleware::apply_middleware;
use crate::nft::NftGateway;
use crate::repository::Location;
use crate::service::{DataService, LocationService};

pub struct HttpServer {
    handlers: Arc<ApiHandlers>,
    addr: SocketAddr,
}

impl HttpServer {
    pub fn new(
        data: Arc<DataService>,
        locations: Arc<LocationService>,
        nft: Arc<dyn NftGateway>,
        addr: SocketAddr,
    ) -> Self {
        Self {
            handlers: Arc::new(ApiHandlers::new(data, locations, nft)),
            addr,
        }
    }

    /// Every route with its middleware stack applied.
    pub fn router(&self) -> Router {
        let routes = Router::new()
            .route("/health", get(health_handler))
            .route("/data", post(create_data_handler).put(update_data_handler))
            .route("/data/", get(missing_key_handler).delete(missing_key_handler))
            .route("/data/:key", get(get_data_handler).delete(delete_data_handler))
            .route(
                "/location",
                get(list_locations_handler)
                    .post(create_location_handler)
                    .put(update_location_handler),
            )
            .route("/location/", get(missing_key_handler).delete(missing_key_handler))
            .route(
                "/location/:id",
                get(get_location_handler).delete(delete_location_handler),
            )
            .route("/token", post(create_token_handler))
            .route("/two/", get(missing_key_handler))
            .route("/two/:name", get(mint_token_handler))
            .with_state(self.handlers.clone());

        apply_middleware(routes)
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();

        info!(addr = %self.addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(&self.addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}

async fn health_handler() -> &'static str {
    ApiHandlers::health().await
}

async fn missing_key_handler() -> ApiError {
    ApiError::missing_key()
}

async fn get_data_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Response> {
    let Path(key) = path?;
    handlers.get_data(&key).await
}

async fn create_data_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    handlers.create_data(body).await
}

async fn update_data_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    handlers.update_data(body).await
}

async fn delete_data_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(key) = path?;
    handlers.delete_data(&key).await
}

async fn get_location_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<Json<Location>> {
    let Path(id) = path?;
    handlers.get_location(&id).await
}

async fn list_locations_handler(
    State(handlers): State<Arc<ApiHandlers>>,
) -> ApiResult<Json<Vec<Location>>> {
    handlers.list_locations().await
}

async fn create_location_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    handlers.create_location(body).await
}

async fn update_location_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    body: Bytes,
) -> ApiResult<StatusCode> {
    handlers.update_location(body).await
}

async fn delete_location_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;
    handlers.delete_location(&id).await
}

async fn create_token_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    body: Bytes,
) -> ApiResult<String> {
    handlers.create_token(body).await
}

async fn mint_token_handler(
    State(handlers): State<Arc<ApiHandlers>>,
    path: Result<Path<String>, PathRejection>,
) -> ApiResult<String> {
    let Path(name) = path?;
    handlers.mint_token(&name).await
}
