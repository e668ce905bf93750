use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::create_timestamp;
use crate::orchestrator::{ExecutionResult, SubmissionStatus, aggregate_verdict};

/// A graded full run, as recorded in the ledger
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Submission {
    pub id: u32,
    pub problem_id: String,
    pub source_code: String,
    pub language: String,
    pub status: SubmissionStatus,
    pub timestamp: String,
    pub results: Vec<ExecutionResult>,
}

#[derive(Default)]
struct LedgerInner {
    next_id: u32,
    submissions: Vec<Submission>,
}

/// In-memory history of submissions for the lifetime of the process
#[derive(Default)]
pub struct Ledger {
    inner: RwLock<LedgerInner>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a submission and returns it with its id, status and timestamp
    pub fn append(
        &self,
        problem_id: &str,
        source_code: &str,
        language: &str,
        results: Vec<ExecutionResult>,
    ) -> Submission {
        let mut inner = self.inner.write();
        inner.next_id += 1;
        let submission = Submission {
            id: inner.next_id,
            problem_id: problem_id.to_string(),
            source_code: source_code.to_string(),
            language: language.to_string(),
            status: aggregate_verdict(&results),
            timestamp: create_timestamp(),
            results,
        };
        inner.submissions.push(submission.clone());
        log::info!(
            "Recorded submission {} for {problem_id}: {:?}",
            submission.id,
            submission.status
        );
        submission
    }

    /// Submissions of one problem, newest first
    pub fn for_problem(&self, problem_id: &str) -> Vec<Submission> {
        self.inner
            .read()
            .submissions
            .iter()
            .rev()
            .filter(|s| s.problem_id == problem_id)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().submissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
