// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::NftConfig;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::nft::models::{TokenInput, UploadRequest};
use crate::nft::traits::NftGateway;

#[derive(Debug, Clone)]
pub struct NftClient {
    client: Client,
    base_url: Url,
    config: NftConfig,
}

impl NftClient {
    pub fn new(config: NftConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("datastore-daemon/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("nft base url {} cannot carry a path", config.base_url);
        }

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::InvalidInput(format!("cannot extend {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: RequestBuilder) -> Result<String> {
        let response = request
            .header(ACCEPT, "text/plain")
            .send()
            .await
            .map_err(Error::upstream("could not reach nft upstream"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(Error::upstream("could not read nft upstream response"))?;

        if !status.is_success() {
            warn!(status = %status, body = %body, "NFT upstream rejected request");
            return Err(Error::UpstreamStatus {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = %status, bytes = body.len(), "NFT upstream responded");
        Ok(body)
    }
}

#[async_trait]
impl NftGateway for NftClient {
    async fn upload(&self, ctx: &Context, input: &TokenInput) -> Result<String> {
        let mut url = self.endpoint(&["v2", "UploadNft", &self.config.project_uid])?;
        url.query_pairs_mut()
            .append_pair("uploadsource", &self.config.upload_source);

        info!(token = %input.tokenname, "Uploading token to NFT upstream");
        let request = self
            .client
            .post(url)
            .header(AUTHORIZATION, input.bearer.as_str())
            .json(&UploadRequest::from(input));

        ctx.run(self.send(request)).await
    }

    async fn mint_and_send(&self, ctx: &Context, name: &str) -> Result<String> {
        let url = self.endpoint(&[
            "v2",
            "MintAndSendSpecific",
            &self.config.project_uid,
            name,
            &self.config.token_count,
            &self.config.receiver_address,
        ])?;

        info!(token = %name, "Minting token through NFT upstream");
        let mut request = self.client.get(url);
        if let Some(ref key) = self.config.api_key {
            request = request.header(AUTHORIZATION, key.as_str());
        }

        ctx.run(self.send(request)).await
    }
}
