use std::collections::VecDeque;

use tokio::sync::{Mutex, Notify, oneshot};

use crate::error::GradingError;
use crate::ledger::Submission;
use crate::orchestrator::ExecutionResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    /// Preview prefix of the test cases, never recorded
    Preview,
    /// Every test case, recorded in the ledger
    Submit,
}

#[derive(Debug)]
pub enum RunOutcome {
    Preview(Vec<ExecutionResult>),
    Submitted(Submission),
}

pub type RunResponder = oneshot::Sender<Result<RunOutcome, GradingError>>;

pub struct RunRequest {
    pub kind: RunKind,
    pub problem_id: String,
    pub source_code: String,
    pub language: String,
    pub responder: RunResponder,
}

impl RunRequest {
    pub fn new(
        kind: RunKind,
        problem_id: impl Into<String>,
        source_code: impl Into<String>,
        language: impl Into<String>,
    ) -> (Self, oneshot::Receiver<Result<RunOutcome, GradingError>>) {
        let (responder, rx) = oneshot::channel();
        let request = Self {
            kind,
            problem_id: problem_id.into(),
            source_code: source_code.into(),
            language: language.into(),
            responder,
        };
        (request, rx)
    }
}

/// FIFO of pending runs, drained by the grading worker
pub struct RunQueue {
    queue: Mutex<VecDeque<RunRequest>>,
    notify: Notify,
}

impl Default for RunQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl RunQueue {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    pub async fn push(&self, request: RunRequest) {
        self.queue.lock().await.push_back(request);
        self.notify.notify_one();
    }

    pub async fn pop(&self) -> RunRequest {
        loop {
            if let Some(request) = self.queue.lock().await.pop_front() {
                return request;
            }
            self.notify.notified().await;
        }
    }

    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
