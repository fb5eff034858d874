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

use std::io;
use std::process::{Command, Output, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// Execute a command with a timeout.
///
/// Returns `Ok(Output)` if the command completes within the timeout. On
/// timeout the caller stops waiting; the child is left to finish on its own
/// helper thread and its output is discarded.
pub fn run_command_with_timeout(
    command: &str,
    args: &[String],
    timeout: Duration,
) -> io::Result<Output> {
    let (tx, rx) = mpsc::channel();

    let command = command.to_string();
    let args = args.to_vec();

    thread::spawn(move || {
        let output = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .output();
        let _ = tx.send(output);
    });

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("Command timed out after {timeout:?}"),
        )),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_command_completes() {
        let out = run_command_with_timeout("echo", &["hello".to_string()], Duration::from_secs(2))
            .expect("echo should succeed");
        assert!(out.status.success());
        assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "hello");
    }

    #[test]
    fn test_command_times_out() {
        let err = run_command_with_timeout("sleep", &["5".to_string()], Duration::from_millis(100))
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::TimedOut);
    }

    #[test]
    fn test_missing_binary_is_io_error() {
        let result = run_command_with_timeout(
            "/nonexistent/fpga-tool",
            &[],
            Duration::from_secs(1),
        );
        assert!(result.is_err());
    }
}
