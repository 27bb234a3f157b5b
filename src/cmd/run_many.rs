//! `fleet run-many`: fan one command out across workspace targets.

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use repofleet::exec::{ExitCodePolicy, allow_codes, non_zero_fails};
use repofleet::runner::{self, RunManyOptions};
use repofleet::workspace::{TargetKind, Workspace};

#[allow(clippy::too_many_arguments)]
pub async fn cmd_run_many(
    config: &Path,
    profile: Option<&str>,
    kind: TargetKind,
    command: &str,
    sequential: bool,
    quiet: bool,
    max_parallel: usize,
    allowed_codes: Option<&str>,
) -> Result<()> {
    let workspace = Workspace::load(config)?;
    let targets = workspace.select_targets(profile, kind)?;

    println!(
        "{}",
        style(format!(
            "Running `{command}` in {} projects",
            targets.len()
        ))
        .green()
    );

    let options = RunManyOptions {
        sequential,
        quiet,
        max_parallel,
        failure_policy: parse_failure_policy(allowed_codes)?,
    };
    let outcomes = runner::run_many(&targets, command, &options).await;

    let failed = outcomes.values().filter(|outcome| outcome.had_error).count();
    if failed > 0 {
        println!(
            "{}",
            style(format!("{failed} of {} targets failed", outcomes.len())).yellow()
        );
    }
    Ok(())
}

/// Build the exit-code policy from a `--allow-codes` list. Zero is always
/// a success, listed or not.
fn parse_failure_policy(allowed_codes: Option<&str>) -> Result<ExitCodePolicy> {
    match allowed_codes {
        None => Ok(non_zero_fails()),
        Some(codes) => {
            let allowed = codes
                .split(',')
                .map(|code| {
                    code.trim()
                        .parse::<i32>()
                        .with_context(|| format!("invalid exit code `{}`", code.trim()))
                })
                .collect::<Result<Vec<i32>>>()?;
            Ok(allow_codes(allowed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_codes_list_parses() {
        let policy = parse_failure_policy(Some("1, 2,3")).unwrap();
        assert!(!policy(0));
        assert!(!policy(2));
        assert!(policy(4));
    }

    #[test]
    fn malformed_allow_codes_are_rejected() {
        assert!(parse_failure_policy(Some("1,x")).is_err());
    }

    #[test]
    fn default_policy_fails_on_non_zero() {
        let policy = parse_failure_policy(None).unwrap();
        assert!(!policy(0));
        assert!(policy(1));
    }
}
