// SPDX-License-Identifier: GPL-3.0-only
pub mod clock;
pub mod models;
pub mod sql;
pub mod traits;

pub use models::{KeyValueEntry, Location};
pub use sql::SqlRepository;
pub use traits::{KeyValueRepository, LocationRepository, Repository, Retention};
