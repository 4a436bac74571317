// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Pipeline persistence
//!
//! One versioned JSON document per pipeline, replaced atomically on save.

mod document;
mod error;
mod json;
mod memory;
mod store;

pub use document::{decode, encode, SCHEMA_VERSION};
pub use error::StoreError;
pub use json::JsonStore;
pub use memory::MemoryStore;
pub use store::{ContextStore, StoreLock};
