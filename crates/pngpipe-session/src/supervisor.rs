use std::io::{self, Read};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::DecoderConfig;
use crate::error::{Result, SessionError};

const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How the decoder process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code, if the process exited normally.
    pub code: Option<i32>,
    /// Terminating signal on Unix.
    pub signal: Option<i32>,
    /// The deadline watchdog killed the process.
    pub timed_out: bool,
    /// Everything the process wrote to stderr, lossily decoded.
    pub stderr: String,
}

impl ProcessExit {
    fn new(status: ExitStatus, timed_out: bool, stderr: Vec<u8>) -> Self {
        #[cfg(unix)]
        let signal = std::os::unix::process::ExitStatusExt::signal(&status);
        #[cfg(not(unix))]
        let signal = None;

        Self {
            code: status.code(),
            signal,
            timed_out,
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        }
    }

    /// True for exit code zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Kills the decoder from another thread.
#[derive(Debug, Clone)]
pub struct KillHandle {
    child: Arc<Mutex<Child>>,
}

impl KillHandle {
    /// Kill the child. Killing an already exited child is not an error.
    pub fn kill(&self) -> io::Result<()> {
        let mut child = lock(&self.child);
        if child.try_wait()?.is_some() {
            return Ok(());
        }
        child.kill()
    }
}

/// A running decoder with its stdout piped to us.
#[derive(Debug)]
pub struct DecoderProcess {
    child: Arc<Mutex<Child>>,
    pid: u32,
    stdout: Option<ChildStdout>,
    stderr_drain: Option<JoinHandle<io::Result<Vec<u8>>>>,
    watchdog: Option<Watchdog>,
}

impl DecoderProcess {
    /// Start the decoder with stdin closed and stdout/stderr piped.
    ///
    /// stderr is drained on a background thread from the start so a chatty
    /// decoder never blocks on a full pipe.
    pub fn spawn(config: &DecoderConfig) -> Result<Self> {
        let mut child = Command::new(&config.program)
            .args(config.args())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| SessionError::Spawn {
                program: config.program.clone(),
                source,
            })?;

        let pid = child.id();
        let stdout = child.stdout.take();
        let stderr_drain = child.stderr.take().map(|mut stderr| {
            thread::spawn(move || {
                let mut buf = Vec::new();
                stderr.read_to_end(&mut buf).map(|_| buf)
            })
        });
        info!(
            pid,
            program = %config.program.display(),
            input = %config.input.display(),
            "decoder started"
        );

        let child = Arc::new(Mutex::new(child));
        let watchdog = config
            .deadline
            .map(|deadline| Watchdog::start(Arc::clone(&child), deadline));

        Ok(Self {
            child,
            pid,
            stdout,
            stderr_drain,
            watchdog,
        })
    }

    /// OS process id.
    pub fn id(&self) -> u32 {
        self.pid
    }

    /// Hand over the stdout pipe. Returns `None` on the second call.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Handle for killing the child from elsewhere (signal handlers, UIs).
    pub fn kill_handle(&self) -> KillHandle {
        KillHandle {
            child: Arc::clone(&self.child),
        }
    }

    /// Wait for the process to exit and collect its stderr.
    ///
    /// Call once stdout has been read to a terminal state. A stdout pipe that
    /// was never taken is closed first.
    pub fn wait(mut self) -> Result<ProcessExit> {
        drop(self.stdout.take());

        let status = loop {
            if let Some(status) = lock(&self.child).try_wait().map_err(SessionError::Wait)? {
                break status;
            }
            thread::sleep(WAIT_POLL_INTERVAL);
        };

        let timed_out = self.watchdog.take().is_some_and(Watchdog::finish);
        let stderr = self.stderr_drain.take().map(collect_stderr).unwrap_or_default();
        let exit = ProcessExit::new(status, timed_out, stderr);

        if exit.success() {
            info!(pid = self.pid, "decoder exited");
        } else {
            warn!(
                pid = self.pid,
                code = ?exit.code,
                signal = ?exit.signal,
                timed_out,
                "decoder exited unsuccessfully"
            );
        }
        Ok(exit)
    }
}

impl Drop for DecoderProcess {
    fn drop(&mut self) {
        if let Some(watchdog) = self.watchdog.take() {
            watchdog.finish();
        }
        let mut child = lock(&self.child);
        if let Ok(None) = child.try_wait() {
            debug!(pid = self.pid, "killing decoder on drop");
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[derive(Debug)]
struct Watchdog {
    cancel: mpsc::Sender<()>,
    fired: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Watchdog {
    fn start(child: Arc<Mutex<Child>>, deadline: Duration) -> Self {
        let (cancel, cancelled) = mpsc::channel::<()>();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&fired);

        let handle = thread::spawn(move || {
            if let Err(RecvTimeoutError::Timeout) = cancelled.recv_timeout(deadline) {
                let mut child = lock(&child);
                if let Ok(None) = child.try_wait() {
                    flag.store(true, Ordering::SeqCst);
                    warn!(?deadline, "decoder deadline elapsed, killing decoder");
                    if let Err(err) = child.kill() {
                        warn!(error = %err, "failed to kill decoder");
                    }
                }
            }
        });

        Self {
            cancel,
            fired,
            handle,
        }
    }

    /// Stop the watchdog and report whether it fired.
    fn finish(self) -> bool {
        let _ = self.cancel.send(());
        let _ = self.handle.join();
        self.fired.load(Ordering::SeqCst)
    }
}

fn collect_stderr(handle: JoinHandle<io::Result<Vec<u8>>>) -> Vec<u8> {
    match handle.join() {
        Ok(Ok(buf)) => buf,
        Ok(Err(err)) => {
            warn!(error = %err, "failed to read decoder stderr");
            Vec::new()
        }
        Err(_) => {
            warn!("decoder stderr reader panicked");
            Vec::new()
        }
    }
}

fn lock(child: &Mutex<Child>) -> MutexGuard<'_, Child> {
    child.lock().unwrap_or_else(PoisonError::into_inner)
}
