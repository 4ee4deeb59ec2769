//! Request and response bodies of `POST /run`

use serde::{Deserialize, Serialize};

use crate::engine::{EngineError, ExecutionResult};

/// A decoded submission
#[derive(Debug, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub source_code: String,
    #[serde(default)]
    pub language: String,
    /// Raw inputs, run in order with no expected output
    #[serde(default)]
    pub inputs: Option<Vec<String>>,
    /// Labeled inputs with expected output
    #[serde(default)]
    pub test_cases: Option<Vec<TestCase>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub input: String,
    #[serde(default, rename = "output")]
    pub expected_output: String,
}

/// One input to run the submission against
#[derive(Debug, Clone, PartialEq)]
pub struct Case {
    pub id: String,
    pub input: String,
    pub expected: Option<String>,
}

impl Submission {
    /// Test cases first, then raw inputs numbered from 1
    pub fn cases(&self) -> Vec<Case> {
        let test_cases = self.test_cases.iter().flatten().map(|tc| Case {
            id: tc.id.clone(),
            input: tc.input.clone(),
            expected: Some(tc.expected_output.clone()),
        });

        let inputs = self
            .inputs
            .iter()
            .flatten()
            .enumerate()
            .map(|(idx, input)| Case {
                id: (idx + 1).to_string(),
                input: input.clone(),
                expected: None,
            });

        test_cases.chain(inputs).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    Fail,
}

/// Outcome of one case as reported to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLog {
    pub id: String,
    pub status: RunStatus,
    pub stderr: String,
    pub stdout: String,
    pub stdin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunLog {
    /// Label a run: it succeeds when the program ran cleanly and, for test
    /// cases, its stdout matches the expected output. Stderr never matters.
    pub fn record(case: Case, outcome: Result<ExecutionResult, EngineError>) -> Self {
        let (output, error) = match outcome {
            Ok(output) => (output, None),
            Err(e) => (e.partial_output().cloned().unwrap_or_default(), Some(e.to_string())),
        };

        let stdout = trim_trailing_newlines(&output.stdout).to_string();
        let stderr = trim_trailing_newlines(&output.stderr).to_string();

        let matches_expected = case
            .expected
            .as_deref()
            .map_or(true, |expected| trim_trailing_newlines(expected) == stdout);

        let status = if error.is_none() && matches_expected {
            RunStatus::Success
        } else {
            RunStatus::Fail
        };

        Self {
            id: case.id,
            status,
            stderr,
            stdout,
            stdin: case.input,
            error,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ResponseBody {
    pub language: String,
    pub logs: Vec<RunLog>,
}

fn trim_trailing_newlines(s: &str) -> &str {
    s.trim_end_matches(|c| c == '\n' || c == '\r')
}
