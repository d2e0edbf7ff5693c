// SPDX-License-Identifier: GPL-3.0-only
pub mod client;
pub mod models;
pub mod traits;

pub use client::NftClient;
pub use models::TokenInput;
pub use traits::NftGateway;
