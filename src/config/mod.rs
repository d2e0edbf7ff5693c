// SPDX-License-Identifier: GPL-3.0-only
#[allow(clippy::module_inception)]
pub mod config;

pub use config::{Config, NftConfig};
