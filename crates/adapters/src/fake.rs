// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake collaborator for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use async_trait::async_trait;
use pf_core::{CollaboratorError, FieldMap, StageAdapter, StageId, StageInput, StageOutput};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A scripted reply
#[derive(Debug, Clone)]
pub enum FakeReply {
    Fields(FieldMap),
    Error(String),
    /// Sleep, then reply; used to exercise caller timeouts
    Delayed(Duration, Box<FakeReply>),
}

/// Fake collaborator that replays scripted replies per stage
///
/// Replies for a stage are consumed in order; the last one repeats once the
/// queue is down to a single entry.
#[derive(Clone, Default)]
pub struct FakeAdapter {
    replies: Arc<Mutex<HashMap<StageId, VecDeque<FakeReply>>>>,
    calls: Arc<Mutex<Vec<StageInput>>>,
}

impl FakeAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply for `stage`
    pub fn reply(&self, stage: impl Into<StageId>, reply: FakeReply) -> &Self {
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .entry(stage.into())
            .or_default()
            .push_back(reply);
        self
    }

    /// Queue a successful reply for `stage`
    pub fn succeed(&self, stage: impl Into<StageId>, fields: FieldMap) -> &Self {
        self.reply(stage, FakeReply::Fields(fields))
    }

    /// Queue an error reply for `stage`
    pub fn fail(&self, stage: impl Into<StageId>, message: impl Into<String>) -> &Self {
        self.reply(stage, FakeReply::Error(message.into()))
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<StageInput> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn next_reply(&self, stage: &StageId) -> Option<FakeReply> {
        let mut replies = self.replies.lock().unwrap_or_else(|e| e.into_inner());
        let queue = replies.get_mut(stage)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl StageAdapter for FakeAdapter {
    async fn run(&self, input: &StageInput) -> Result<StageOutput, CollaboratorError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(input.clone());

        let mut reply = self.next_reply(&input.stage).ok_or_else(|| {
            CollaboratorError::new(format!("no scripted reply for stage '{}'", input.stage))
        })?;
        loop {
            match reply {
                FakeReply::Fields(fields) => return Ok(StageOutput::new(fields)),
                FakeReply::Error(message) => return Err(CollaboratorError::new(message)),
                FakeReply::Delayed(delay, inner) => {
                    tokio::time::sleep(delay).await;
                    reply = *inner;
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
