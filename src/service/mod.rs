// SPDX-License-Identifier: GPL-3.0-only
pub mod data;
pub mod location;
pub mod retention;

pub use data::DataService;
pub use location::LocationService;
pub use retention::run_retention;
