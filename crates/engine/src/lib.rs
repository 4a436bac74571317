// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Paperflow pipeline coordinator

mod coordinator;
mod error;
mod locks;

pub use coordinator::{Advance, Coordinator};
pub use error::CoordinatorError;
pub use locks::PipelineLocks;
