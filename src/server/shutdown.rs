//! Graceful shutdown handling for prober
//!
//! Handles SIGTERM and SIGINT signals, and fatal listener errors:
//! - Flips the process from running to draining, exactly once
//! - Lets `/graceDelay` requests observe the drain and cut their wait short
//! - Waits a bounded time for in-flight requests, then force-closes

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

/// Read side of the shutdown flag
///
/// Cloned into every component that needs to see the drain.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Wait for shutdown signal
    pub async fn wait(&mut self) {
        while !*self.receiver.borrow() {
            if self.receiver.changed().await.is_err() {
                // Sender dropped, treat as shutdown
                break;
            }
        }
    }

    /// Check if the process is draining (non-blocking)
    pub fn is_draining(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Write side of the shutdown flag
#[derive(Debug)]
pub struct ShutdownController {
    sender: watch::Sender<bool>,
}

impl ShutdownController {
    /// Move the process into draining
    ///
    /// Returns `true` for the call that performed the transition; later
    /// calls change nothing and return `false`.
    pub fn shutdown(&self) -> bool {
        let started = self.sender.send_if_modified(|draining| {
            if *draining {
                false
            } else {
                *draining = true;
                true
            }
        });
        if started {
            info!("Shutdown signal sent, draining");
        }
        started
    }

    /// Create another reader of this flag
    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.sender.subscribe(),
        }
    }
}

/// Create a new shutdown signal pair
///
/// Returns (controller, signal) where:
/// - controller: Used to trigger shutdown
/// - signal: Cloned and passed to components that need to listen
pub fn shutdown_channel() -> (ShutdownController, ShutdownSignal) {
    let (sender, receiver) = watch::channel(false);
    (ShutdownController { sender }, ShutdownSignal { receiver })
}

/// Wait for SIGTERM or SIGINT signal
///
/// Returns the signal name that was received. If the handlers cannot be
/// registered this never resolves, leaving a listener failure as the only
/// way into shutdown.
#[cfg(unix)]
pub async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(sigterm), Ok(sigint)) => (sigterm, sigint),
            (Err(e), _) | (_, Err(e)) => {
                error!(error = %e, "Failed to register signal handlers");
                return std::future::pending().await;
            }
        };

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM");
            "SIGTERM"
        }
        _ = sigint.recv() => {
            info!("Received SIGINT");
            "SIGINT"
        }
    }
}

/// Wait for Ctrl+C signal (Windows)
#[cfg(not(unix))]
pub async fn wait_for_signal() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to wait for Ctrl+C");
        return std::future::pending().await;
    }
    info!("Received Ctrl+C");
    "CTRL_C"
}

/// What started the shutdown sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownTrigger {
    /// An OS termination signal, by name
    Signal(&'static str),
    /// The listener stopped on its own (bind or serve failure)
    ServerExited(String),
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownTrigger::Signal(name) => write!(f, "signal {}", name),
            ShutdownTrigger::ServerExited(reason) => write!(f, "server exited: {}", reason),
        }
    }
}

/// How the drain ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every in-flight connection finished before the timeout
    Drained,
    /// The listener failed, either before or during the drain
    ServerFailed(String),
    /// The timeout elapsed and the serve task was aborted
    ///
    /// Connection tasks spawned by the listener are not cancelled by the
    /// abort; they close when the runtime shuts down, which `main` does by
    /// returning right after.
    ForcedClose,
}

/// Drives `serving -> draining -> terminated`
///
/// `run` consumes the coordinator, so the sequence happens at most once.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    controller: ShutdownController,
    drain_timeout: Duration,
}

impl ShutdownCoordinator {
    pub fn new(controller: ShutdownController, drain_timeout: Duration) -> Self {
        Self {
            controller,
            drain_timeout,
        }
    }

    /// Wait for a trigger, then drain the server
    ///
    /// `server` is the task running the listener; it is expected to stop
    /// accepting and finish in-flight requests once the shutdown signal
    /// fires. `termination` resolves with a signal name when the OS asks
    /// the process to stop.
    pub async fn run<F>(
        self,
        mut server: JoinHandle<std::io::Result<()>>,
        termination: F,
    ) -> DrainOutcome
    where
        F: Future<Output = &'static str>,
    {
        let trigger = tokio::select! {
            result = &mut server => ShutdownTrigger::ServerExited(describe_exit(result)),
            name = termination => ShutdownTrigger::Signal(name),
        };

        self.controller.shutdown();
        info!(reason = %trigger, "Server shutdown");

        if let ShutdownTrigger::ServerExited(reason) = trigger {
            // Listener already gone, nothing left to drain
            error!(error = %reason, "Server stopped before shutdown was requested");
            return DrainOutcome::ServerFailed(reason);
        }

        match tokio::time::timeout(self.drain_timeout, &mut server).await {
            Ok(Ok(Ok(()))) => {
                info!("In-flight requests drained");
                DrainOutcome::Drained
            }
            Ok(result) => {
                let reason = describe_exit(result);
                warn!(error = %reason, "Server failed while draining");
                DrainOutcome::ServerFailed(reason)
            }
            Err(_) => {
                // Stops the accept loop only; open connections die with the runtime
                server.abort();
                warn!(
                    timeout_secs = self.drain_timeout.as_secs(),
                    "Drain timeout elapsed, forcing server close"
                );
                DrainOutcome::ForcedClose
            }
        }
    }
}

fn describe_exit(result: Result<std::io::Result<()>, JoinError>) -> String {
    match result {
        Ok(Ok(())) => "listener closed".to_string(),
        Ok(Err(e)) => e.to_string(),
        Err(e) => format!("server task failed: {}", e),
    }
}
