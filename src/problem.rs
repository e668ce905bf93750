use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adapter::adapt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Example {
    pub input: String,
    pub output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

/// One language flavour of a problem
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CodeVariant {
    pub language: String,
    pub starter_code: String,
    /// Symbol the grader calls with the adapted positional arguments
    pub entry_point: String,
    #[serde(default)]
    pub solution: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct TestCase {
    pub input: Vec<Value>,
    pub expected: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SolutionInfo {
    pub approach_title: String,
    pub time_complexity: String,
    pub space_complexity: String,
}

/// How a raw test-case tuple is packed into positional arguments
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Packing {
    /// The tuple already is the argument list.
    #[default]
    Positional,
    /// The trailing element is its own argument; everything before it forms
    /// the first argument.
    SplitTrailing,
}

/// Parameter names and packing of a problem's entry point
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub parameters: Vec<String>,
    #[serde(default)]
    pub packing: Packing,
}

impl Signature {
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonPolicy {
    /// Top-level arrays are compared as multisets.
    #[default]
    Unordered,
    Exact,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Problem {
    pub id: String,
    pub title: String,
    pub difficulty: Difficulty,
    pub description: String,
    #[serde(default)]
    pub examples: Vec<Example>,
    #[serde(default)]
    pub constraints: Vec<String>,
    pub default_language: String,
    pub code_variants: Vec<CodeVariant>,
    pub test_cases: Vec<TestCase>,
    #[serde(default)]
    pub solution_info: Option<SolutionInfo>,
    pub signature: Signature,
    #[serde(default)]
    pub comparison: ComparisonPolicy,
}

impl Problem {
    pub fn variant(&self, language: &str) -> Option<&CodeVariant> {
        self.code_variants.iter().find(|v| v.language == language)
    }

    /// The first `n` test cases, used for preview runs
    pub fn preview_cases(&self, n: usize) -> &[TestCase] {
        &self.test_cases[..n.min(self.test_cases.len())]
    }

    /// Checks the invariants the grader relies on
    ///
    /// Every entry point must be a plain identifier, the default language must
    /// have a variant, and every test case must adapt to exactly the declared
    /// arity.
    pub fn validate(&self) -> Result<()> {
        if self.code_variants.is_empty() {
            bail!("problem {} has no code variants", self.id);
        }
        if self.variant(&self.default_language).is_none() {
            bail!(
                "problem {} has no variant for its default language {}",
                self.id,
                self.default_language
            );
        }
        for variant in &self.code_variants {
            if !is_identifier(&variant.entry_point) {
                bail!(
                    "problem {}: entry point {:?} for {} is not an identifier",
                    self.id,
                    variant.entry_point,
                    variant.language
                );
            }
        }
        for (idx, case) in self.test_cases.iter().enumerate() {
            if let Err(e) = adapt(&self.signature, &case.input) {
                bail!("problem {}: test case {}: {e}", self.id, idx + 1);
            }
        }
        Ok(())
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Problem {
        serde_json::from_value(json!({
            "id": "two-sum",
            "title": "Two Sum",
            "difficulty": "Easy",
            "description": "",
            "default_language": "javascript",
            "code_variants": [{
                "language": "javascript",
                "starter_code": "var twoSum = function(nums, target) {};",
                "entry_point": "twoSum"
            }],
            "test_cases": [
                { "input": [[2, 7, 11, 15], 9], "expected": [0, 1] },
                { "input": [[3, 2, 4], 6], "expected": [1, 2] }
            ],
            "signature": { "parameters": ["nums", "target"] }
        }))
        .unwrap()
    }

    #[test]
    fn test_defaults_from_json() {
        let problem = sample();
        assert_eq!(problem.signature.packing, Packing::Positional);
        assert_eq!(problem.comparison, ComparisonPolicy::Unordered);
        assert!(problem.variant("javascript").is_some());
        assert!(problem.variant("python").is_none());
        problem.validate().unwrap();
    }

    #[test]
    fn test_preview_cases_clamps() {
        let problem = sample();
        assert_eq!(problem.preview_cases(3).len(), 2);
        assert_eq!(problem.preview_cases(1).len(), 1);
    }

    #[test]
    fn test_validate_rejects_arity_mismatch() {
        let mut problem = sample();
        problem.test_cases.push(TestCase {
            input: vec![json!([1, 2])],
            expected: json!([0, 1]),
        });
        let err = problem.validate().unwrap_err().to_string();
        assert!(err.contains("test case 3"), "{err}");
    }

    #[test]
    fn test_validate_rejects_bad_entry_point() {
        let mut problem = sample();
        problem.code_variants[0].entry_point = "twoSum(); evil".to_string();
        assert!(problem.validate().is_err());
    }
}
