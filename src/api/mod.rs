// SPDX-License-Identifier: GPL-3.0-only
pub mod handlers;
pub mod http;
pub mod middleware;

pub use http::HttpServer;
