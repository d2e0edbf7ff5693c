// SPDX-License-Identifier: GPL-3.0-only
pub mod engine;
pub mod entity;

pub use engine::StorageEngine;
pub use entity::{Column, Entity, Timestamped, Value};
