//! Fan-out execution of one command across many target directories.
//!
//! One invocation owns its result map; targets never observe each other's
//! in-flight state. A failing target is recorded and never aborts its
//! siblings, so the batch as a whole always resolves with one outcome per
//! target.

use std::collections::BTreeMap;
use std::path::PathBuf;

use console::style;
use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::exec::{self, ExecOptions, ExitCodePolicy, non_zero_fails};
use crate::workspace::Target;

/// Default upper bound on concurrently running subprocesses.
pub const DEFAULT_MAX_PARALLEL: usize = 4;

/// How a batch run behaves.
#[derive(Clone)]
pub struct RunManyOptions {
    /// Run targets one at a time in submission order.
    pub sequential: bool,
    /// Suppress per-target output.
    pub quiet: bool,
    /// Worker-pool size for concurrent runs.
    pub max_parallel: usize,
    /// Exit-code classification applied to every target's command.
    pub failure_policy: ExitCodePolicy,
}

impl Default for RunManyOptions {
    fn default() -> Self {
        Self {
            sequential: false,
            quiet: false,
            max_parallel: DEFAULT_MAX_PARALLEL,
            failure_policy: non_zero_fails(),
        }
    }
}

/// Result of one target's command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub had_error: bool,
    /// Captured stdout on success, diagnostic text on failure.
    pub output: String,
}

/// Run `command` in every target directory and collect per-target
/// outcomes, keyed by the target's directory.
///
/// In sequential mode each target is fully finished (outcome recorded and
/// printed) before the next starts, so emitted output follows submission
/// order. In concurrent mode (default) at most `max_parallel` subprocesses
/// are in flight and completion order is unspecified. Either way the
/// returned map has exactly one entry per target and the call itself never
/// fails.
pub async fn run_many(
    targets: &[Target],
    command: &str,
    options: &RunManyOptions,
) -> BTreeMap<PathBuf, Outcome> {
    let mut outcomes = BTreeMap::new();

    if options.sequential {
        for target in targets {
            let (dir, outcome) = run_target(target, command, options).await;
            outcomes.insert(dir, outcome);
        }
        return outcomes;
    }

    let mut completions = stream::iter(targets)
        .map(|target| run_target(target, command, options))
        .buffer_unordered(options.max_parallel.max(1));
    while let Some((dir, outcome)) = completions.next().await {
        outcomes.insert(dir, outcome);
    }
    outcomes
}

/// Run one target's command and convert the result, success or failure,
/// into an outcome record, emitting it unless the run is quiet.
async fn run_target(
    target: &Target,
    command: &str,
    options: &RunManyOptions,
) -> (PathBuf, Outcome) {
    debug!(dir = %target.dir.display(), %command, "running target");
    let exec_options = ExecOptions {
        cwd: Some(target.dir.clone()),
        failure_policy: options.failure_policy.clone(),
        ..ExecOptions::default()
    };

    match exec::run_shell(command, &exec_options).await {
        Ok(stdout) => {
            let output = stdout.trim_end_matches('\n').to_string();
            if !options.quiet {
                println!("{}", style(target.dir.display()).cyan().bold());
                println!("{output}");
            }
            (
                target.dir.clone(),
                Outcome {
                    had_error: false,
                    output,
                },
            )
        }
        Err(error) => {
            let output = error.to_string();
            if !options.quiet {
                eprintln!("{}", style(target.dir.display()).red().bold());
                eprintln!("{}", style(&output).red());
            }
            (
                target.dir.clone(),
                Outcome {
                    had_error: true,
                    output,
                },
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::never_fails;
    use tempfile::tempdir;

    fn quiet_options() -> RunManyOptions {
        RunManyOptions {
            quiet: true,
            ..RunManyOptions::default()
        }
    }

    fn targets_in(root: &std::path::Path, names: &[&str]) -> Vec<Target> {
        names
            .iter()
            .map(|name| {
                let dir = root.join(name);
                std::fs::create_dir_all(&dir).unwrap();
                Target { dir }
            })
            .collect()
    }

    #[tokio::test]
    async fn no_targets_yields_an_empty_map() {
        let outcomes = run_many(&[], "echo hello", &quiet_options()).await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn one_failure_does_not_abort_the_batch() {
        let root = tempdir().unwrap();
        let targets = targets_in(root.path(), &["a", "b", "c"]);
        std::fs::write(targets[0].dir.join("marker"), "from a").unwrap();
        std::fs::write(targets[2].dir.join("marker"), "from c").unwrap();

        let outcomes = run_many(&targets, "cat marker", &quiet_options()).await;

        assert_eq!(outcomes.len(), 3);
        let a = &outcomes[&targets[0].dir];
        let b = &outcomes[&targets[1].dir];
        let c = &outcomes[&targets[2].dir];
        assert!(!a.had_error);
        assert_eq!(a.output, "from a");
        assert!(b.had_error);
        assert!(b.output.contains("exited with code"));
        assert!(!c.had_error);
        assert_eq!(c.output, "from c");
    }

    #[tokio::test]
    async fn never_fails_policy_records_success_with_captured_output() {
        let root = tempdir().unwrap();
        let targets = targets_in(root.path(), &["a"]);

        let options = RunManyOptions {
            failure_policy: never_fails(),
            ..quiet_options()
        };
        let outcomes = run_many(&targets, "echo findings; exit 9", &options).await;

        let outcome = &outcomes[&targets[0].dir];
        assert!(!outcome.had_error);
        assert_eq!(outcome.output, "findings");
    }

    #[tokio::test]
    async fn sequential_mode_completes_targets_in_submission_order() {
        let root = tempdir().unwrap();
        let targets = targets_in(root.path(), &["slow", "fast"]);
        std::fs::write(targets[0].dir.join("slow"), "").unwrap();

        let log = root.path().join("completions.log");
        let command = format!(
            "test -f slow && sleep 0.2; basename \"$PWD\" >> {}",
            log.display()
        );

        let options = RunManyOptions {
            sequential: true,
            ..quiet_options()
        };
        let outcomes = run_many(&targets, &command, &options).await;
        assert_eq!(outcomes.len(), 2);

        let recorded = std::fs::read_to_string(&log).unwrap();
        let order: Vec<&str> = recorded.lines().collect();
        assert_eq!(order, vec!["slow", "fast"]);
    }

    #[tokio::test]
    async fn concurrent_mode_completes_every_target() {
        let root = tempdir().unwrap();
        let targets = targets_in(root.path(), &["slow", "fast"]);
        std::fs::write(targets[0].dir.join("slow"), "").unwrap();

        let command = "test -f slow && sleep 0.2; basename \"$PWD\"";
        let outcomes = run_many(&targets, command, &quiet_options()).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[&targets[0].dir].output, "slow");
        assert_eq!(outcomes[&targets[1].dir].output, "fast");
    }

    #[tokio::test]
    async fn pool_size_below_one_still_runs() {
        let root = tempdir().unwrap();
        let targets = targets_in(root.path(), &["a", "b"]);

        let options = RunManyOptions {
            max_parallel: 0,
            ..quiet_options()
        };
        let outcomes = run_many(&targets, "echo ok", &options).await;
        assert_eq!(outcomes.len(), 2);
    }

    #[tokio::test]
    async fn launch_failures_are_recorded_as_outcomes() {
        let targets = vec![Target {
            dir: PathBuf::from("/nonexistent/fleet/target"),
        }];
        let outcomes = run_many(&targets, "echo unreachable", &quiet_options()).await;

        let outcome = &outcomes[&targets[0].dir];
        assert!(outcome.had_error);
        assert!(outcome.output.contains("failed to launch"));
    }
}
