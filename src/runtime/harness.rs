//! Wrapper programs that call a user's entry point inside a child interpreter
//! and report back on stdout.
//!
//! The child reads `{"source", "entry_point", "args", "nonce"}` from stdin,
//! evaluates the source, calls the entry point on the arguments and prints one
//! marker line: [`RESULT_MARKER`] and the nonce followed by
//! `{"value": ..., "elapsed_ms": ...}`, or [`ERROR_MARKER`] and the nonce
//! followed by a JSON string holding the error message. It exits right after
//! the line is flushed, so timers or threads left behind by user code neither
//! hold the child open nor get to print afterwards. Other output is ignored.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Dialect;

pub const RESULT_MARKER: &str = "__GRADER_RESULT__";
pub const ERROR_MARKER: &str = "__GRADER_ERROR__";

const JAVASCRIPT_HARNESS: &str = r#"
(() => {
  const fs = require('fs');
  const { performance } = require('perf_hooks');
  const payload = JSON.parse(fs.readFileSync(0, 'utf8'));
  const finish = (line) => process.stdout.write('\n' + line + '\n', () => process.exit(0));
  try {
    const entry = new Function(payload.source + '\nreturn ' + payload.entry_point + ';')();
    const start = performance.now();
    const value = entry(...payload.args);
    const elapsed = performance.now() - start;
    finish('__GRADER_RESULT__' + payload.nonce + JSON.stringify({ value: value === undefined ? null : value, elapsed_ms: elapsed }));
  } catch (e) {
    finish('__GRADER_ERROR__' + payload.nonce + JSON.stringify(e instanceof Error ? e.message : String(e)));
  }
})();
"#;

const PYTHON_HARNESS: &str = r#"
import json, os, sys, time
def __grader_main():
    payload = json.loads(sys.stdin.read())
    nonce = payload["nonce"]
    scope = {"__name__": "__grader__"}
    try:
        exec(compile(payload["source"], "<solution>", "exec"), scope)
        entry = scope.get(payload["entry_point"])
        if entry is None:
            raise NameError("name '%s' is not defined" % payload["entry_point"])
        start = time.perf_counter()
        value = entry(*payload["args"])
        elapsed = (time.perf_counter() - start) * 1000.0
        line = "__GRADER_RESULT__" + nonce + json.dumps({"value": value, "elapsed_ms": elapsed})
    except BaseException as e:
        line = "__GRADER_ERROR__" + nonce + json.dumps(str(e) or type(e).__name__)
    out = sys.__stdout__
    out.write("\n" + line + "\n")
    out.flush()
    os._exit(0)
__grader_main()
"#;

const JAVASCRIPT_VERSION_PROBE: &str = "process.stdout.write(process.versions.node)";
const PYTHON_VERSION_PROBE: &str = "import sys; print('%d.%d.%d' % sys.version_info[:3])";

/// Command line flag that makes the interpreter run an inline program
pub fn inline_flag(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Javascript => "-e",
        Dialect::Python => "-c",
    }
}

pub fn script(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Javascript => JAVASCRIPT_HARNESS,
        Dialect::Python => PYTHON_HARNESS,
    }
}

pub fn version_probe(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::Javascript => JAVASCRIPT_VERSION_PROBE,
        Dialect::Python => PYTHON_VERSION_PROBE,
    }
}

#[derive(Serialize)]
struct Payload<'a> {
    source: &'a str,
    entry_point: &'a str,
    args: &'a [Value],
    nonce: &'a str,
}

/// Stdin payload for one invocation; `nonce` tags the reply line
pub fn payload(
    source: &str,
    entry_point: &str,
    args: &[Value],
    nonce: &str,
) -> serde_json::Result<String> {
    serde_json::to_string(&Payload {
        source,
        entry_point,
        args,
        nonce,
    })
}

#[derive(Deserialize)]
struct ResultLine {
    #[serde(default)]
    value: Value,
    elapsed_ms: Option<f64>,
}

/// What the child interpreter reported
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Returned {
        value: Value,
        elapsed: Option<Duration>,
    },
    Raised(String),
    /// A marker was found but its body was not valid JSON
    Malformed(String),
}

/// Finds the last marker line carrying `nonce` in the child's stdout
pub fn parse_reply(stdout: &str, nonce: &str) -> Option<Reply> {
    for line in stdout.lines().rev() {
        if let Some(body) = tagged(line, RESULT_MARKER, nonce) {
            return Some(match serde_json::from_str::<ResultLine>(body) {
                Ok(result) => Reply::Returned {
                    value: result.value,
                    elapsed: result
                        .elapsed_ms
                        .filter(|ms| ms.is_finite() && *ms >= 0.0)
                        .map(|ms| Duration::from_nanos((ms * 1_000_000.0).round() as u64)),
                },
                Err(e) => Reply::Malformed(format!("unreadable result from interpreter: {e}")),
            });
        }
        if let Some(body) = tagged(line, ERROR_MARKER, nonce) {
            return Some(match serde_json::from_str::<String>(body) {
                Ok(message) => Reply::Raised(message),
                Err(e) => Reply::Malformed(format!("unreadable error from interpreter: {e}")),
            });
        }
    }
    None
}

fn tagged<'a>(line: &'a str, marker: &str, nonce: &str) -> Option<&'a str> {
    line.strip_prefix(marker)?.strip_prefix(nonce)
}
