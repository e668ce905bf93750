use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

/// Number of leading test cases used by a preview run
pub const DEFAULT_PREVIEW_CASES: usize = 3;

#[derive(Parser)]
#[command(name = "grader", version = "1.0", about, long_about = None)]
pub struct CliArgs {
    /// Path to the configuration file
    #[arg(long = "config", short = 'c')]
    pub config_path: String,

    /// Run every canonical solution through the grader, report and exit
    #[arg(long = "verify-solutions", default_value_t = false)]
    pub verify_solutions: bool,
}

impl CliArgs {
    /// Load the configuration from the specified file
    pub fn to_config(&self) -> std::io::Result<Config> {
        let file = std::fs::File::open(&self.config_path)?;
        let reader = std::io::BufReader::new(file);
        serde_json::from_reader(reader).map_err(|e| e.into())
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// Directory holding one JSON file per problem
    pub problems_dir: String,
    pub preview_cases: Option<usize>,
    pub continue_on_error: Option<bool>,
    pub languages: Vec<LanguageConfig>,
}

impl Config {
    pub fn preview_cases(&self) -> usize {
        self.preview_cases.unwrap_or(DEFAULT_PREVIEW_CASES)
    }

    pub fn continue_on_error(&self) -> bool {
        self.continue_on_error.unwrap_or(false)
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: Option<String>,
    pub bind_port: Option<u16>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct LanguageConfig {
    pub name: String,
    pub dialect: Dialect,
    /// Interpreter argv, e.g. `["node"]` or `["python3", "-u"]`
    pub command: Vec<String>,
    /// Wall time allowed for a single entry point invocation
    pub time_limit: MicroSecond,
    #[serde(flatten)]
    pub runtime: RuntimeKind,
}

/// Which harness wraps the user's source
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    Javascript,
    Python,
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "runtime", rename_all = "snake_case")]
pub enum RuntimeKind {
    /// Usable as soon as the process starts
    Direct,
    /// Must be provisioned before use; `version` is a prefix the detected
    /// interpreter version has to match
    Hosted { version: String },
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MicroSecond(pub u64);

impl From<MicroSecond> for Duration {
    fn from(value: MicroSecond) -> Self {
        Duration::from_micros(value.0)
    }
}
