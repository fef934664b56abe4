//! Rendering results for people and for machines.

use std::fmt::Write;

use crate::error::Result;
use crate::result::CheckResult;

pub fn all_healthy(results: &[CheckResult]) -> bool {
    results.iter().all(|result| result.healthy)
}

/// One line per endpoint. Verbose output adds captured bodies underneath.
pub fn render_text(results: &[CheckResult], verbose: bool) -> String {
    let mut out = String::new();

    for result in results {
        let mark = if result.healthy { "✅" } else { "❌" };
        let _ = write!(out, "{} {} [{}]", mark, result.name, result.check_type);

        if result.status_code != 0 {
            let _ = write!(out, " {}", result.status_code);
        }

        let _ = write!(out, " {}ms", result.latency.as_millis());

        if result.retries > 0 {
            let _ = write!(out, " (retries: {})", result.retries);
        }

        if !result.error.is_empty() {
            let _ = write!(out, " \t {}", result.error);
        }
        out.push('\n');

        if verbose && !result.body.is_empty() {
            for line in result.body.lines() {
                let _ = writeln!(out, "    | {}", line);
            }
        }
    }

    let healthy = results.iter().filter(|result| result.healthy).count();
    let _ = writeln!(out, "{}/{} healthy", healthy, results.len());

    out
}

pub fn render_json(results: &[CheckResult]) -> Result<String> {
    Ok(serde_json::to_string_pretty(results)?)
}
