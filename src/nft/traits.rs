// SPDX-License-Identifier: GPL-3.0-only
use async_trait::async_trait;

use crate::context::Context;
use crate::error::Result;
use crate::nft::models::TokenInput;

/// Upstream NFT minting service.
#[async_trait]
pub trait NftGateway: Send + Sync {
    /// Register a token with the upstream project; returns the raw upstream body
    async fn upload(&self, ctx: &Context, input: &TokenInput) -> Result<String>;

    /// Mint the named token and send it to the configured receiver
    async fn mint_and_send(&self, ctx: &Context, name: &str) -> Result<String>;
}
