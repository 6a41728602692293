//! Scripted collaborators for tests.

use crate::ModelDriver;
use async_trait::async_trait;
use panelsmith_core::{ChatRequest, ChatResponse, TokenUsage};
use panelsmith_error::{PanelsmithResult, UpstreamError, UpstreamErrorKind};
use std::collections::VecDeque;
use std::sync::Mutex;

/// One canned driver outcome.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    /// Return this response
    Reply(ChatResponse),
    /// Fail with this upstream condition
    Fail(UpstreamErrorKind),
}

/// A [`ModelDriver`] that replays canned replies in order and records every request.
///
/// # Examples
///
/// ```rust,ignore
/// use panelsmith_interface::{ModelDriver, testing::ScriptedDriver};
/// use panelsmith_core::{ChatRequest, Message};
///
/// # tokio_test::block_on(async {
/// let driver = ScriptedDriver::new().reply("{\"ok\":true}", None);
/// let response = driver.invoke(&ChatRequest::from_messages(vec![Message::user("hi")])).await.unwrap();
/// assert_eq!(response.content, "{\"ok\":true}");
/// assert_eq!(driver.call_count(), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct ScriptedDriver {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedDriver {
    /// Driver with no replies queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn reply(self, content: impl Into<String>, usage: Option<TokenUsage>) -> Self {
        self.push(ScriptedReply::Reply(ChatResponse::new(content, usage)));
        self
    }

    /// Queue a failure.
    pub fn fail(self, kind: UpstreamErrorKind) -> Self {
        self.push(ScriptedReply::Fail(kind));
        self
    }

    /// Queue an outcome through a shared reference.
    pub fn push(&self, reply: ScriptedReply) {
        self.replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(reply);
    }

    /// Number of `invoke` calls so far.
    pub fn call_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    /// Requests received so far.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ModelDriver for ScriptedDriver {
    async fn invoke(&self, request: &ChatRequest) -> PanelsmithResult<ChatResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request.clone());

        let next = self
            .replies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();

        match next {
            Some(ScriptedReply::Reply(response)) => Ok(response),
            Some(ScriptedReply::Fail(kind)) => Err(UpstreamError::new(kind).into()),
            None => Err(UpstreamError::new(UpstreamErrorKind::Transport(
                "scripted driver has no replies left".to_string(),
            ))
            .into()),
        }
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}
