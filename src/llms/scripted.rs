//! In-memory gateway for tests.
//!
//! Rules match a needle against `instructions + "\n" + input` in the order
//! they were added. Each rule holds a queue of replies; the last reply of a
//! queue repeats forever.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{GatewayRequest, ModelGateway, StructuredMode};
use crate::evaluator::errors::GatewayError;

struct Rule {
    needle: String,
    replies: VecDeque<Result<String, String>>,
}

pub(crate) struct ScriptedGateway {
    rules: Mutex<Vec<Rule>>,
    requests: Mutex<Vec<GatewayRequest>>,
    calls: AtomicUsize,
    mode: StructuredMode,
}

impl ScriptedGateway {
    pub(crate) fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            mode: StructuredMode::NativeThenText,
        }
    }

    pub(crate) fn text_only(mut self) -> Self {
        self.mode = StructuredMode::TextOnly;
        self
    }

    fn push(self, needle: &str, reply: Result<String, String>) -> Self {
        {
            let mut rules = self.rules.lock();
            match rules.iter_mut().find(|r| r.needle == needle) {
                Some(rule) => rule.replies.push_back(reply),
                None => rules.push(Rule {
                    needle: needle.to_string(),
                    replies: VecDeque::from([reply]),
                }),
            }
        }
        self
    }

    /// Reply with `reply` when `needle` occurs in the request.
    pub(crate) fn on(self, needle: &str, reply: &str) -> Self {
        self.push(needle, Ok(reply.to_string()))
    }

    /// Fail with `message` when `needle` occurs in the request.
    pub(crate) fn fail_on(self, needle: &str, message: &str) -> Self {
        self.push(needle, Err(message.to_string()))
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn requests(&self) -> Vec<GatewayRequest> {
        self.requests.lock().clone()
    }

    /// Number of recorded requests whose instructions or input contain `needle`.
    pub(crate) fn calls_matching(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.instructions.contains(needle) || r.input.contains(needle))
            .count()
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    fn provider(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn structured_mode(&self) -> StructuredMode {
        self.mode
    }

    async fn invoke(&self, request: &GatewayRequest) -> Result<String, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        let haystack = format!("{}\n{}", request.instructions, request.input);

        let reply = {
            let mut rules = self.rules.lock();
            rules
                .iter_mut()
                .find(|r| haystack.contains(&r.needle) && !r.replies.is_empty())
                .and_then(|rule| {
                    if rule.replies.len() > 1 {
                        rule.replies.pop_front()
                    } else {
                        rule.replies.front().cloned()
                    }
                })
        };

        match reply {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(GatewayError::Transport {
                provider: "scripted".to_string(),
                message,
            }),
            None => Err(GatewayError::InvalidResponse {
                provider: "scripted".to_string(),
                message: "no scripted reply".to_string(),
            }),
        }
    }
}
