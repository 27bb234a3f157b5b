//! Typed errors for the subprocess execution layer.
//!
//! Everything above the executor converts these into per-target outcome
//! records or wraps them with `anyhow` context at the command level.

use thiserror::Error;

/// Failure of one shell command invocation.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The subprocess could not be started at all.
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The subprocess ran and exited with a code the caller's policy
    /// classifies as failure. `detail` carries captured stderr, falling
    /// back to stdout when stderr was empty.
    #[error("`{command}` exited with code {code}: {detail}")]
    ExitCode {
        command: String,
        code: i32,
        detail: String,
    },
}

impl ExecError {
    /// Exit code carried by the error, if the subprocess got far enough
    /// to report one.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ExecError::Launch { .. } => None,
            ExecError::ExitCode { code, .. } => Some(*code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_error_carries_io_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such directory");
        let err = ExecError::Launch {
            command: "git pull".to_string(),
            source: io_err,
        };
        match &err {
            ExecError::Launch { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("expected Launch variant"),
        }
        assert_eq!(err.exit_code(), None);
        assert!(err.to_string().contains("git pull"));
    }

    #[test]
    fn exit_code_error_carries_code_and_detail() {
        let err = ExecError::ExitCode {
            command: "npm ci".to_string(),
            code: 127,
            detail: "npm: command not found".to_string(),
        };
        assert_eq!(err.exit_code(), Some(127));
        assert!(err.to_string().contains("127"));
        assert!(err.to_string().contains("command not found"));
    }
}
