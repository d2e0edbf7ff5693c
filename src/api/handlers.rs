// SPDX-License-Identifier: GPL-3.0-only
use axum::body::Bytes;
use axum::extract::rejection::PathRejection;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::context::Context;
use crate::error::{Error, ErrorKind};
use crate::nft::{NftGateway, TokenInput};
use crate::repository::Location;
use crate::service::{DataService, LocationService};

/// Body of every error reply.
#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    #[serde(rename = "Error")]
    pub error: String,
}

/// Key-value pair accepted by `POST /data` and `PUT /data`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Pair {
    #[serde(alias = "Key")]
    pub key: String,
    #[serde(alias = "Value")]
    pub value: String,
}

/// Failure reply: a status and the message sent to the client.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn missing_key() -> Self {
        Self::bad_request("missing key")
    }

    /// Log the cause and reply with a generic message. Upstream failures
    /// become 502, everything else 500.
    fn from_service(err: Error, message: &str) -> Self {
        error!(error = %err, kind = ?err.kind(), "{message}");
        let status = if err.is(ErrorKind::UpstreamFailure) {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        Self {
            status,
            message: message.to_string(),
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorMessage { error: self.message })).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Decode a JSON body, echoing the decoder's message on failure.
fn decode<T: DeserializeOwned>(body: &Bytes) -> ApiResult<T> {
    serde_json::from_slice(body).map_err(|e| ApiError::bad_request(e.to_string()))
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    if raw.is_empty() {
        return Err(ApiError::missing_key());
    }
    raw.parse()
        .map_err(|_| ApiError::bad_request("could not convert to int"))
}

pub struct ApiHandlers {
    data: Arc<DataService>,
    locations: Arc<LocationService>,
    nft: Arc<dyn NftGateway>,
}

impl ApiHandlers {
    pub fn new(
        data: Arc<DataService>,
        locations: Arc<LocationService>,
        nft: Arc<dyn NftGateway>,
    ) -> Self {
        Self {
            data,
            locations,
            nft,
        }
    }
}

impl ApiHandlers {
    pub async fn health() -> &'static str {
        "ok"
    }

    pub async fn get_data(&self, key: &str) -> ApiResult<Response> {
        if key.is_empty() {
            return Err(ApiError::missing_key());
        }

        let value = self
            .data
            .get(&Context::background(), key)
            .await
            .map_err(|e| ApiError::from_service(e, "could not retrieve entry"))?;

        Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], value).into_response())
    }

    pub async fn create_data(&self, body: Bytes) -> ApiResult<StatusCode> {
        let pair: Pair = decode(&body)?;

        self.data
            .add(&Context::background(), &pair.key, &pair.value)
            .await
            .map_err(|e| ApiError::from_service(e, "could not create entry"))?;

        info!(key = %pair.key, "Data entry created");
        Ok(StatusCode::OK)
    }

    pub async fn update_data(&self, body: Bytes) -> ApiResult<StatusCode> {
        let pair: Pair = decode(&body)?;

        self.data
            .update(&Context::background(), &pair.key, &pair.value)
            .await
            .map_err(|e| ApiError::from_service(e, "could not update entry"))?;

        Ok(StatusCode::CREATED)
    }

    pub async fn delete_data(&self, key: &str) -> ApiResult<StatusCode> {
        if key.is_empty() {
            return Err(ApiError::missing_key());
        }

        self.data
            .delete(&Context::background(), key)
            .await
            .map_err(|e| ApiError::from_service(e, "could not delete entry"))?;

        info!(key = %key, "Data entry deleted");
        Ok(StatusCode::NO_CONTENT)
    }

    pub async fn get_location(&self, raw_id: &str) -> ApiResult<Json<Location>> {
        let id = parse_id(raw_id)?;

        let location = self
            .locations
            .get(&Context::background(), id)
            .await
            .map_err(|e| ApiError::from_service(e, "could not retrieve location"))?;

        Ok(Json(location))
    }

    pub async fn list_locations(&self) -> ApiResult<Json<Vec<Location>>> {
        let locations = self
            .locations
            .get_all(&Context::background())
            .await
            .map_err(|e| ApiError::from_service(e, "could not retrieve locations"))?;

        Ok(Json(locations))
    }

    pub async fn create_location(&self, body: Bytes) -> ApiResult<StatusCode> {
        let location: Location = decode(&body)?;

        let stored = self
            .locations
            .add(&Context::background(), location)
            .await
            .map_err(|e| ApiError::from_service(e, "could not create location"))?;

        info!(id = stored.id, "Location created");
        Ok(StatusCode::CREATED)
    }

    pub async fn update_location(&self, body: Bytes) -> ApiResult<StatusCode> {
        let location: Location = decode(&body)?;

        self.locations
            .update(&Context::background(), location)
            .await
            .map_err(|e| ApiError::from_service(e, "could not update location"))?;

        Ok(StatusCode::CREATED)
    }

    pub async fn delete_location(&self, raw_id: &str) -> ApiResult<StatusCode> {
        let id = parse_id(raw_id)?;

        self.locations
            .delete(&Context::background(), id)
            .await
            .map_err(|e| ApiError::from_service(e, "could not delete location"))?;

        info!(id, "Location deleted");
        Ok(StatusCode::NO_CONTENT)
    }

    pub async fn create_token(&self, body: Bytes) -> ApiResult<String> {
        let input: TokenInput = decode(&body)?;

        self.nft
            .upload(&Context::background(), &input)
            .await
            .map_err(|e| ApiError::from_service(e, "could not create token"))
    }

    pub async fn mint_token(&self, name: &str) -> ApiResult<String> {
        if name.is_empty() {
            return Err(ApiError::missing_key());
        }

        self.nft
            .mint_and_send(&Context::background(), name)
            .await
            .map_err(|e| ApiError::from_service(e, "could not mint token"))
    }
}
