//! External tool invocation behind the `ToolRunner` seam.
//!
//! The engine never spawns processes directly: lint, fix, coverage and git
//! steps describe an `Invocation` and receive a `ToolOutcome`. The live runner
//! enforces the timeout by polling the child and killing it once the budget
//! is spent; stdout/stderr are drained on background threads so a chatty
//! tool cannot block on a full pipe. Collecting the drained output shares the
//! same deadline, since a background grandchild can hold the pipes open after
//! the child itself exits.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
/// A single external command to run.
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub timeout: Duration,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
            timeout,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Shell-like rendering for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Every way an invocation can end.
pub enum ToolOutcome {
    Completed(ToolOutput),
    TimedOut { after: Duration },
    Missing { program: String },
    Failed { message: String },
}

/// Runs external commands. Implementations must be shareable across threads
/// so batch operations can fan out per module.
pub trait ToolRunner: Send + Sync {
    fn run(&self, invocation: &Invocation) -> ToolOutcome;
}

/// Runner backed by `std::process::Command`.
pub struct LiveRunner;

impl ToolRunner for LiveRunner {
    fn run(&self, invocation: &Invocation) -> ToolOutcome {
        debug!(
            "running `{}` in {}",
            invocation.display(),
            invocation.cwd.display()
        );
        let spawned = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();
        let child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("{} not found", invocation.program);
                return ToolOutcome::Missing {
                    program: invocation.program.clone(),
                };
            }
            Err(e) => {
                return ToolOutcome::Failed {
                    message: format!("Failed to run {}: {}", invocation.program, e),
                }
            }
        };
        wait_with_timeout(child, invocation)
    }
}

#[derive(Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

fn timed_out(invocation: &Invocation) -> ToolOutcome {
    warn!(
        "`{}` timed out after {}s",
        invocation.display(),
        invocation.timeout.as_secs()
    );
    ToolOutcome::TimedOut {
        after: invocation.timeout,
    }
}

fn wait_with_timeout(mut child: Child, invocation: &Invocation) -> ToolOutcome {
    let (tx, rx) = mpsc::channel();
    let mut pending = 0;
    if let Some(pipe) = child.stdout.take() {
        drain(pipe, Stream::Stdout, tx.clone());
        pending += 1;
    }
    if let Some(pipe) = child.stderr.take() {
        drain(pipe, Stream::Stderr, tx.clone());
        pending += 1;
    }
    drop(tx);
    let deadline = Instant::now() + invocation.timeout;

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    return timed_out(invocation);
                }
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                let _ = child.kill();
                return ToolOutcome::Failed {
                    message: format!("Failed to wait for {}: {}", invocation.program, e),
                };
            }
        }
    };

    // Pipes stay open while any descendant holds them, so the drain is
    // bounded by the same deadline as the child.
    let (mut stdout, mut stderr) = (String::new(), String::new());
    for _ in 0..pending {
        let left = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(left) {
            Ok((Stream::Stdout, text)) => stdout = text,
            Ok((Stream::Stderr, text)) => stderr = text,
            Err(RecvTimeoutError::Timeout) => return timed_out(invocation),
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    ToolOutcome::Completed(ToolOutput {
        exit_code: status.code().unwrap_or(-1),
        stdout,
        stderr,
    })
}

fn drain<R: Read + Send + 'static>(mut pipe: R, stream: Stream, tx: Sender<(Stream, String)>) {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send((stream, String::from_utf8_lossy(&buf).into_owned()));
    });
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted runner returning canned outcomes per program + first arg.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct ScriptedRunner {
        outcomes: Mutex<HashMap<String, Vec<ToolOutcome>>>,
        pub calls: Mutex<Vec<Invocation>>,
        /// Files to create when a matching invocation runs (simulates artifacts).
        pub creates: Mutex<HashMap<String, PathBuf>>,
    }

    impl ScriptedRunner {
        fn key(program: &str, first: Option<&str>) -> String {
            format!("{} {}", program, first.unwrap_or(""))
        }

        /// Queue an outcome for `program first_arg ...`; repeated calls pop in order,
        /// the last outcome sticks.
        pub fn on(self, program: &str, first_arg: &str, outcome: ToolOutcome) -> Self {
            self.outcomes
                .lock()
                .unwrap()
                .entry(Self::key(program, Some(first_arg)))
                .or_default()
                .push(outcome);
            self
        }

        pub fn creating(self, program: &str, first_arg: &str, path: PathBuf) -> Self {
            self.creates
                .lock()
                .unwrap()
                .insert(Self::key(program, Some(first_arg)), path);
            self
        }

        pub fn completed(exit_code: i32, stdout: &str, stderr: &str) -> ToolOutcome {
            ToolOutcome::Completed(ToolOutput {
                exit_code,
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            })
        }

        pub fn calls(&self) -> Vec<Invocation> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ToolRunner for ScriptedRunner {
        fn run(&self, invocation: &Invocation) -> ToolOutcome {
            self.calls.lock().unwrap().push(invocation.clone());
            let key = Self::key(
                &invocation.program,
                invocation.args.first().map(String::as_str),
            );
            if let Some(path) = self.creates.lock().unwrap().get(&key) {
                std::fs::write(path, "mode: set\n").unwrap();
            }
            let mut map = self.outcomes.lock().unwrap();
            match map.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.remove(0),
                Some(queue) if !queue.is_empty() => queue[0].clone(),
                _ => ToolOutcome::Missing {
                    program: invocation.program.clone(),
                },
            }
        }
    }
}
