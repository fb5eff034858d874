// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Vendor tool execution.
//
// - Every run has a timeout
// - stdout/stderr are decoded as lossy UTF-8
// - Optional exit status check

use std::time::Duration;

use crate::error::{Error, Result};
use crate::utils::command_timeout::run_command_with_timeout;

use super::config::DEFAULT_COMMAND_TIMEOUT_SECS;

/// Options to control command execution behavior.
#[derive(Debug, Clone)]
pub struct CommandOptions {
    pub timeout: Duration,
    /// If true, non-zero exit statuses will return an error.
    pub check_status: bool,
}

impl Default for CommandOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS),
            check_status: true,
        }
    }
}

/// Normalized command output.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Process exit code (or -1 if unavailable)
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Run `command` with `args`.
///
/// Spawn failures and timeouts map to [`Error::Io`]; a non-zero exit status
/// maps to [`Error::Command`] when `options.check_status` is set.
pub fn execute_command(
    command: &str,
    args: &[String],
    options: &CommandOptions,
) -> Result<CommandOutput> {
    let output = run_command_with_timeout(command, args, options.timeout)?;

    let status = output.status.code().unwrap_or(-1);
    let out = CommandOutput {
        status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    };

    if options.check_status && status != 0 {
        return Err(Error::Command(format!(
            "'{command} {}' exited with {status}: {}",
            args.join(" "),
            out.stderr.trim()
        )));
    }

    Ok(out)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_execute_command_success() {
        let out = execute_command("echo", &["hello".to_string()], &CommandOptions::default())
            .expect("echo should succeed");
        assert_eq!(out.status, 0);
        assert!(out.stdout.contains("hello"));
    }

    #[test]
    fn test_execute_command_with_status_check() {
        let err = execute_command("false", &[], &CommandOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Command(_)));
    }

    #[test]
    fn test_execute_command_without_status_check() {
        let options = CommandOptions {
            check_status: false,
            ..CommandOptions::default()
        };
        let out = execute_command("false", &[], &options).unwrap();
        assert_ne!(out.status, 0);
    }
}
