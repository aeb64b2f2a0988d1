//! Subprocess boundary.
//!
//! Every external command goes through [`CommandRunner`], which reports one
//! of three outcomes instead of raising: the command completed (with its exit
//! status and combined output), it ran past its timeout and was killed, or it
//! could not be run at all.

use std::io::{self, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug)]
/// Typed result of one subprocess invocation.
pub enum RunOutcome {
    Completed { success: bool, output: String },
    TimedOut,
    Failed(io::Error),
}

impl RunOutcome {
    pub fn completed(success: bool, output: impl Into<String>) -> Self {
        RunOutcome::Completed {
            success,
            output: output.into(),
        }
    }

    /// True when the failure means the executable does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RunOutcome::Failed(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

/// Runs a command vector in an optional working directory with a timeout.
pub trait CommandRunner {
    fn run(&self, cmd: &[String], cwd: Option<&Path>, timeout: Duration) -> RunOutcome;
}

impl<F> CommandRunner for F
where
    F: Fn(&[String], Option<&Path>, Duration) -> RunOutcome,
{
    fn run(&self, cmd: &[String], cwd: Option<&Path>, timeout: Duration) -> RunOutcome {
        self(cmd, cwd, timeout)
    }
}

#[derive(Debug, Clone, Copy, Default)]
/// Real subprocess execution via `std::process`.
pub struct SystemRunner;

/// Forward a pipe's bytes to a channel from a reader thread until EOF.
fn drain<R: Read + Send + 'static>(mut reader: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(chunk[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(_) => break,
            }
        }
    });
    rx
}

/// Gather a pipe's output until EOF or `deadline`, whichever comes first.
///
/// A grandchild that inherited the pipe can hold it open after the child
/// exits; past the deadline only what has already arrived is kept.
fn collect(rx: Option<Receiver<Vec<u8>>>, deadline: Instant) -> String {
    let Some(rx) = rx else {
        return String::new();
    };
    let mut bytes = Vec::new();
    loop {
        match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(chunk) => bytes.extend(chunk),
            Err(RecvTimeoutError::Timeout) => {
                bytes.extend(rx.try_iter().flatten());
                debug!("output pipe still open at deadline");
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &[String], cwd: Option<&Path>, timeout: Duration) -> RunOutcome {
        let Some((program, args)) = cmd.split_first() else {
            return RunOutcome::Failed(io::Error::new(io::ErrorKind::InvalidInput, "empty command"));
        };
        debug!(cmd = %cmd.join(" "), cwd = ?cwd, timeout_secs = timeout.as_secs(), "spawning");
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = cwd {
            command.current_dir(dir);
        }
        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(e) => return RunOutcome::Failed(e),
        };
        // Drain both pipes concurrently so a chatty child cannot block on a full pipe.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    debug!(program = %program, "killed after timeout");
                    return RunOutcome::TimedOut;
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => {
                    let _ = child.kill();
                    return RunOutcome::Failed(e);
                }
            }
        };
        let mut output = collect(stdout, deadline);
        output.push_str(&collect(stderr, deadline));
        RunOutcome::Completed {
            success: status.success(),
            output,
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn captures_stdout_and_stderr() {
        let out = SystemRunner.run(
            &cmd(&["sh", "-c", "echo out; echo err 1>&2; exit 3"]),
            None,
            Duration::from_secs(10),
        );
        match out {
            RunOutcome::Completed { success, output } => {
                assert!(!success);
                assert!(output.contains("out"));
                assert!(output.contains("err"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn kills_on_timeout() {
        let started = Instant::now();
        let out = SystemRunner.run(&cmd(&["sleep", "5"]), None, Duration::from_millis(100));
        assert!(matches!(out, RunOutcome::TimedOut));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn inherited_pipe_does_not_outlive_the_timeout() {
        let started = Instant::now();
        let out = SystemRunner.run(
            &cmd(&["sh", "-c", "sleep 5 & echo hi"]),
            None,
            Duration::from_secs(1),
        );
        assert!(started.elapsed() < Duration::from_secs(3));
        match out {
            RunOutcome::Completed { success, output } => {
                assert!(success);
                assert!(output.contains("hi"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn missing_binary_is_not_found() {
        let out = SystemRunner.run(
            &cmd(&["metalint-no-such-binary-xyz"]),
            None,
            Duration::from_secs(1),
        );
        assert!(out.is_not_found());
    }

    #[test]
    fn runs_in_cwd() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "hi").unwrap();
        let out = SystemRunner.run(&cmd(&["ls"]), Some(dir.path()), Duration::from_secs(5));
        match out {
            RunOutcome::Completed { success, output } => {
                assert!(success);
                assert!(output.contains("marker.txt"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn closures_are_runners() {
        let fake = |_: &[String], _: Option<&Path>, _: Duration| RunOutcome::completed(true, "ok");
        assert!(matches!(
            fake.run(&cmd(&["x"]), None, Duration::from_secs(1)),
            RunOutcome::Completed { success: true, .. }
        ));
        assert!(matches!(
            SystemRunner.run(&[], None, Duration::from_secs(1)),
            RunOutcome::Failed(_)
        ));
    }
}
