use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::problem::Problem;

/// Read-only collection of problems, in catalog order
#[derive(Debug, Default)]
pub struct ProblemCatalog {
    problems: Vec<Problem>,
}

impl ProblemCatalog {
    /// Builds a catalog after validating every problem and rejecting
    /// duplicate identifiers
    pub fn new(problems: Vec<Problem>) -> Result<Self> {
        for (idx, problem) in problems.iter().enumerate() {
            problem.validate()?;
            if problems[..idx].iter().any(|p| p.id == problem.id) {
                bail!("duplicate problem id {}", problem.id);
            }
        }
        Ok(Self { problems })
    }

    /// Loads every `*.json` file of `dir`, sorted by file name
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)
            .with_context(|| format!("Failed to read problem directory {}", dir.display()))?
        {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut problems = Vec::with_capacity(paths.len());
        for path in paths {
            let file = fs::File::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            let problem: Problem = serde_json::from_reader(std::io::BufReader::new(file))
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            log::debug!("Loaded problem {} from {}", problem.id, path.display());
            problems.push(problem);
        }

        let catalog = Self::new(problems)?;
        log::info!(
            "Loaded {} problems from {}",
            catalog.problems.len(),
            dir.display()
        );
        Ok(catalog)
    }

    pub fn get_problem(&self, id: &str) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id == id)
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }
}
