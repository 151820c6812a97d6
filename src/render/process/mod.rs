//! Backend that delegates drawing to an external renderer speaking line-delimited JSON.

/// Command and diagnostic records.
pub mod protocol;

use std::fmt;
use std::io::{BufReader, Write as _};
use std::process::{Child, ChildStderr, ChildStdin, Command as ProcessCommand, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::foundation::error::{TermlayerError, TermlayerResult};
use crate::render::backend::{DrawRequest, RenderBackend};

pub use protocol::{Command, DiagRecord};

const MIN_POLL: Duration = Duration::from_millis(1);

/// Receives failures that happen outside any call: renderer error records, malformed
/// diagnostics and unexpected exits.
pub type ErrorCallback = Arc<dyn Fn(TermlayerError) + Send + Sync>;

/// Construction options for [`ProcessBackend`].
#[derive(Clone)]
pub struct ProcessBackendOpts {
    /// Renderer executable, looked up on `PATH`.
    pub program: String,
    /// Arguments selecting the JSON command parser.
    pub args: Vec<String>,
    /// Sink for asynchronous failures.
    pub on_error: ErrorCallback,
    /// How long [`RenderBackend::shutdown`] waits for the renderer before killing it.
    pub shutdown_grace: Duration,
    /// How often the exit watcher polls the renderer.
    pub exit_poll_interval: Duration,
}

impl Default for ProcessBackendOpts {
    fn default() -> Self {
        Self {
            program: "ueberzug".to_owned(),
            args: ["layer", "--parser", "json", "--loader", "synchronous"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            on_error: Arc::new(|e: TermlayerError| {
                tracing::error!(error = %e, "renderer failure");
            }),
            shutdown_grace: Duration::from_millis(500),
            exit_poll_interval: Duration::from_millis(50),
        }
    }
}

impl fmt::Debug for ProcessBackendOpts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessBackendOpts")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("shutdown_grace", &self.shutdown_grace)
            .field("exit_poll_interval", &self.exit_poll_interval)
            .finish_non_exhaustive()
    }
}

struct Agent {
    child: Arc<Mutex<Child>>,
    stdin: ChildStdin,
}

/// Everything guarded by the command lock. Background tasks only touch `alive` and
/// `exit_reported`, and only for their own `generation`.
#[derive(Default)]
struct AgentState {
    agent: Option<Agent>,
    alive: bool,
    generation: u64,
    exit_reported: bool,
}

/// Drives one lazily spawned renderer process.
pub struct ProcessBackend {
    opts: ProcessBackendOpts,
    state: Arc<Mutex<AgentState>>,
}

impl fmt::Debug for ProcessBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("ProcessBackend")
            .field("opts", &self.opts)
            .field("running", &state.agent.is_some())
            .field("alive", &state.alive)
            .field("generation", &state.generation)
            .finish()
    }
}

impl ProcessBackend {
    /// A backend that spawns its renderer on the first command.
    pub fn new(opts: ProcessBackendOpts) -> Self {
        Self {
            opts,
            state: Arc::new(Mutex::new(AgentState::default())),
        }
    }

    /// How many renderer processes have been started so far.
    pub fn spawn_count(&self) -> u64 {
        lock(&self.state).generation
    }

    /// Whether a renderer is running and believed healthy.
    pub fn is_alive(&self) -> bool {
        let state = lock(&self.state);
        state.agent.is_some() && state.alive
    }

    /// Write `cmd`, spawning the renderer when needed. A failed write respawns once and retries.
    ///
    /// With `spawn` unset, the command is dropped when no renderer is running.
    pub fn send(&self, cmd: &Command, spawn: bool) -> TermlayerResult<()> {
        let line = cmd
            .to_line()
            .map_err(|e| TermlayerError::protocol(format!("encode command: {e}")))?;
        let mut reports = Vec::new();
        let result = {
            let mut state = lock(&self.state);
            self.send_locked(&mut state, &line, spawn, &mut reports)
        };
        for report in reports {
            (self.opts.on_error)(report);
        }
        result
    }

    fn send_locked(
        &self,
        state: &mut AgentState,
        line: &str,
        spawn: bool,
        reports: &mut Vec<TermlayerError>,
    ) -> TermlayerResult<()> {
        if !spawn && !(state.agent.is_some() && state.alive) {
            return Ok(());
        }

        let mut last_err = None;
        for _ in 0..2 {
            self.ensure_running(state, reports)?;
            let Some(agent) = state.agent.as_mut() else {
                return Err(TermlayerError::resource("renderer is not running"));
            };
            let written = agent
                .stdin
                .write_all(line.as_bytes())
                .and_then(|()| agent.stdin.flush());
            match written {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        generation = state.generation,
                        error = %e,
                        "write to renderer failed"
                    );
                    state.alive = false;
                    last_err = Some(e);
                }
            }
        }
        Err(TermlayerError::protocol(format!(
            "renderer rejected command: {}",
            last_err.map_or_else(|| "unknown".to_owned(), |e| e.to_string())
        )))
    }

    fn ensure_running(
        &self,
        state: &mut AgentState,
        reports: &mut Vec<TermlayerError>,
    ) -> TermlayerResult<()> {
        if state.agent.is_some() && state.alive {
            return Ok(());
        }
        if let Some(old) = state.agent.take() {
            if let Some(status) = retire(&old, Duration::ZERO, self.opts.exit_poll_interval)
                && !state.exit_reported
            {
                reports.push(unexpected_exit(status));
            }
            state.exit_reported = true;
            tracing::warn!(generation = state.generation, "respawning renderer");
        }
        self.spawn(state)
    }

    fn spawn(&self, state: &mut AgentState) -> TermlayerResult<()> {
        let mut child = ProcessCommand::new(&self.opts.program)
            .args(&self.opts.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                TermlayerError::resource(format!(
                    "failed to spawn renderer '{}': {e}",
                    self.opts.program
                ))
            })?;

        let stdin = child.stdin.take();
        let stderr = child.stderr.take();
        let (Some(stdin), Some(stderr)) = (stdin, stderr) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(TermlayerError::resource("failed to open renderer pipes"));
        };

        state.generation += 1;
        state.alive = true;
        state.exit_reported = false;
        let generation = state.generation;
        tracing::debug!(
            generation,
            pid = child.id(),
            program = %self.opts.program,
            "spawned renderer"
        );

        let child = Arc::new(Mutex::new(child));
        spawn_drain(
            stderr,
            Arc::clone(&self.state),
            generation,
            Arc::clone(&self.opts.on_error),
        );
        spawn_exit_watch(
            Arc::clone(&child),
            Arc::clone(&self.state),
            generation,
            self.opts.exit_poll_interval.max(MIN_POLL),
            Arc::clone(&self.opts.on_error),
        );
        state.agent = Some(Agent { child, stdin });
        Ok(())
    }
}

impl RenderBackend for ProcessBackend {
    #[tracing::instrument(level = "debug", skip_all, fields(layer = req.name))]
    fn issue(&self, req: &DrawRequest<'_>) -> TermlayerResult<()> {
        if !req.visible {
            return self.send(
                &Command::Remove {
                    identifier: req.name.to_owned(),
                    draw: true,
                },
                false,
            );
        }
        let path = req.path.to_str().ok_or_else(|| {
            TermlayerError::content(format!("'{}' is not valid UTF-8", req.path.display()))
        })?;
        let cmd = Command::Add {
            identifier: req.name.to_owned(),
            x: req.rect.x,
            y: req.rect.y,
            path: path.to_owned(),
            width: req.rect.width,
            height: req.rect.height,
            draw: true,
            synchronously_draw: req.synchronous,
            scaler: req.policy,
            scaling_position_x: req.scaling_position.0,
            scaling_position_y: req.scaling_position.1,
        };
        self.send(&cmd, true)
    }

    fn retract(&self, name: &str) -> TermlayerResult<()> {
        self.send(
            &Command::Remove {
                identifier: name.to_owned(),
                draw: true,
            },
            false,
        )
    }

    fn shutdown(&self) -> TermlayerResult<()> {
        let mut state = lock(&self.state);
        let Some(agent) = state.agent.take() else {
            return Ok(());
        };
        state.alive = false;
        state.exit_reported = true;
        let Agent { child, stdin } = agent;
        drop(stdin);
        let status = retire_child(&child, self.opts.shutdown_grace, self.opts.exit_poll_interval);
        tracing::debug!(generation = state.generation, ?status, "renderer stopped");
        Ok(())
    }
}

impl Drop for ProcessBackend {
    fn drop(&mut self) {
        if let Err(e) = RenderBackend::shutdown(self) {
            tracing::warn!(error = %e, "renderer shutdown failed");
        }
    }
}

/// Stop the process behind `agent`. Returns its status when it had already exited by itself.
fn retire(agent: &Agent, grace: Duration, poll: Duration) -> Option<ExitStatus> {
    let exited = lock(&agent.child).try_wait().ok().flatten();
    if exited.is_none() {
        retire_child(&agent.child, grace, poll);
    }
    exited
}

/// Wait up to `grace` for `child` to exit, then kill it. Returns the final status if known.
fn retire_child(child: &Mutex<Child>, grace: Duration, poll: Duration) -> Option<ExitStatus> {
    let deadline = Instant::now() + grace;
    loop {
        let polled = lock(child).try_wait();
        match polled {
            Ok(Some(status)) => return Some(status),
            Ok(None) if Instant::now() < deadline => {
                std::thread::sleep(poll.max(MIN_POLL).min(grace));
            }
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "polling renderer failed");
                break;
            }
        }
    }
    let mut child = lock(child);
    if let Err(e) = child.kill() {
        tracing::warn!(error = %e, "killing renderer failed");
    }
    child.wait().ok()
}

fn spawn_drain(
    stderr: ChildStderr,
    state: Arc<Mutex<AgentState>>,
    generation: u64,
    on_error: ErrorCallback,
) {
    std::thread::spawn(move || {
        let records =
            serde_json::Deserializer::from_reader(BufReader::new(stderr)).into_iter::<DiagRecord>();
        for record in records {
            match record {
                Ok(r) if r.is_error() => on_error(TermlayerError::renderer(r.name, r.message)),
                Ok(r) => {
                    tracing::debug!(
                        kind = %r.kind,
                        name = %r.name,
                        message = %r.message,
                        "renderer diagnostic"
                    );
                }
                Err(e) => {
                    mark_down(&state, generation);
                    on_error(TermlayerError::protocol(format!(
                        "malformed diagnostic record: {e}"
                    )));
                    return;
                }
            }
        }
        mark_down(&state, generation);
    });
}

fn spawn_exit_watch(
    child: Arc<Mutex<Child>>,
    state: Arc<Mutex<AgentState>>,
    generation: u64,
    interval: Duration,
    on_error: ErrorCallback,
) {
    std::thread::spawn(move || {
        loop {
            std::thread::sleep(interval);
            let polled = lock(&child).try_wait();
            let status = match polled {
                Ok(Some(status)) => status,
                Ok(None) => {
                    if lock(&state).generation != generation {
                        return;
                    }
                    continue;
                }
                Err(e) => {
                    tracing::warn!(generation, error = %e, "polling renderer failed");
                    return;
                }
            };
            let report = {
                let mut st = lock(&state);
                let current = st.generation == generation && !st.exit_reported;
                if current {
                    st.alive = false;
                    st.exit_reported = true;
                }
                current
            };
            if report {
                on_error(unexpected_exit(status));
            }
            return;
        }
    });
}

fn mark_down(state: &Mutex<AgentState>, generation: u64) {
    let mut st = lock(state);
    if st.generation == generation && st.alive {
        tracing::debug!(generation, "renderer diagnostics closed");
        st.alive = false;
    }
}

fn unexpected_exit(status: ExitStatus) -> TermlayerError {
    TermlayerError::protocol(format!("renderer exited unexpectedly ({status})"))
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(all(test, unix))]
#[path = "../../../tests/unit/render/process.rs"]
mod tests;
