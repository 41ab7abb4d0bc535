//! Print session manager
//!
//! Owns the single logical device connection and serializes every print
//! and drawer job through one worker task. Submissions are non-blocking;
//! results arrive through the job callback. The worker takes a mutex over
//! the driver for the whole job, so at most one job touches the device at
//! a time even if submissions race.
//!
//! Known limit: there is no cancellation and no timeout at this layer. A
//! driver call that never completes blocks every queued job behind it;
//! transports enforce their own connect/send timeouts.

use crate::command::{CutMode, PrintCommand};
use crate::driver::DeviceDriver;
use crate::error::{PrintError, PrintResult};
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Completion callback, invoked exactly once per submitted job with the
/// job's success flag
pub type JobCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Job lifecycle states
///
/// `Error` is reachable from every non-idle state; every path out of a
/// job converges on the shared cleanup before the lock is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    Locked,
    Connecting,
    Transacting,
    Sending,
    StatusCheck,
    Committing,
    Disconnecting,
    Error,
}

fn enter(state: SessionState) {
    debug!(state = ?state, "session state");
}

/// One queued device job
struct PrintJob {
    target: String,
    commands: Vec<PrintCommand>,
    open_drawer: bool,
    /// Drawer-only jobs skip the main print protocol entirely
    drawer_only: bool,
    callback: Option<JobCallback>,
}

/// Serialized access to one printing device
///
/// Construct once (inside a tokio runtime) and share by `Arc`; there is
/// deliberately no global instance.
pub struct PrintSessionManager {
    tx: mpsc::UnboundedSender<PrintJob>,
    shutdown: CancellationToken,
}

impl PrintSessionManager {
    /// Create the manager and spawn its worker task
    pub fn new(driver: Box<dyn DeviceDriver>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let shutdown = CancellationToken::new();
        let driver = Arc::new(Mutex::new(driver));

        tokio::spawn(run_worker(rx, shutdown.clone(), driver));

        Self { tx, shutdown }
    }

    /// Enqueue a print job; returns immediately
    ///
    /// Jobs execute in FIFO submission order. `callback` fires on the
    /// worker task once the job reaches a terminal state.
    pub fn submit_job(
        &self,
        target: impl Into<String>,
        commands: Vec<PrintCommand>,
        open_drawer: bool,
        callback: Option<JobCallback>,
    ) -> PrintResult<()> {
        self.enqueue(PrintJob {
            target: target.into(),
            commands,
            open_drawer,
            drawer_only: false,
            callback,
        })
    }

    /// Enqueue a drawer-open job without printing; returns immediately
    pub fn open_drawer(
        &self,
        target: impl Into<String>,
        callback: Option<JobCallback>,
    ) -> PrintResult<()> {
        self.enqueue(PrintJob {
            target: target.into(),
            commands: Vec::new(),
            open_drawer: true,
            drawer_only: true,
            callback,
        })
    }

    /// Stop the worker. The in-flight job completes; queued jobs are
    /// failed through their callbacks.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    fn enqueue(&self, job: PrintJob) -> PrintResult<()> {
        self.tx.send(job).map_err(|_| PrintError::QueueClosed)
    }
}

/// Worker loop: drains the job channel one job at a time
async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<PrintJob>,
    shutdown: CancellationToken,
    driver: Arc<Mutex<Box<dyn DeviceDriver>>>,
) {
    info!("Print session worker started");

    loop {
        tokio::select! {
            // Shutdown wins over new work
            biased;

            _ = shutdown.cancelled() => {
                info!("Print session worker received shutdown signal");
                break;
            }
            job = rx.recv() => {
                let Some(job) = job else {
                    info!("Job channel closed, print session worker stopping");
                    return;
                };
                execute_job(&driver, job).await;
            }
        }
    }

    // Fail queued jobs so every callback still fires exactly once
    rx.close();
    while let Ok(job) = rx.try_recv() {
        if let Some(callback) = job.callback {
            callback(false);
        }
    }
}

/// Run one job to a terminal state, holding the device lock throughout
async fn execute_job(driver: &Arc<Mutex<Box<dyn DeviceDriver>>>, job: PrintJob) {
    let mut driver = driver.lock().await;
    enter(SessionState::Locked);

    let mut has_error = false;

    // Fresh handle for this job
    enter(SessionState::Connecting);
    driver.clear_buffer();

    enter(SessionState::Transacting);

    // Drawer sub-protocol: its failure counts against the job result but
    // never prevents the main print attempt
    if job.open_drawer {
        if let Err(e) = run_drawer(driver.as_mut(), &job.target).await {
            error!(target = %job.target, error = %e, "Drawer pulse failed");
            has_error = true;
        }
    }

    if !job.drawer_only {
        build_buffer(driver.as_mut(), &job.commands);

        // Stages after a failure still run so diagnostics stay complete
        if let Err(e) = run_print(driver.as_mut(), &job.target).await {
            error!(target = %job.target, error = %e, "Print protocol failed");
            has_error = true;
        }
    }

    // Shared cleanup: every path converges here before the lock drops
    driver.clear_buffer();
    if let Err(e) = driver.disconnect().await {
        warn!(error = %e, "Cleanup disconnect failed");
    }

    enter(if has_error {
        SessionState::Error
    } else {
        SessionState::Idle
    });

    if let Some(callback) = job.callback {
        callback(!has_error);
    }
}

/// Drawer pulse through its own connect/transact/send/disconnect round
async fn run_drawer(driver: &mut dyn DeviceDriver, target: &str) -> PrintResult<()> {
    driver.clear_buffer();
    driver.append_command(&PrintCommand::drawer_pulse())?;

    driver.connect(target).await?;
    if let Err(e) = driver.begin_transaction().await {
        let _ = driver.disconnect().await;
        return Err(e);
    }

    let status = driver.status().await?;
    if !status.is_printable() {
        let _ = driver.disconnect().await;
        return Err(PrintError::NotPrintable(target.to_string()));
    }

    if let Err(e) = driver.send().await {
        let _ = driver.disconnect().await;
        return Err(e);
    }
    driver.wait_job_finished().await?;
    driver.end_transaction().await?;
    driver.disconnect().await?;
    driver.clear_buffer();

    info!(target = %target, "Drawer pulse sent");
    Ok(())
}

/// Build the device buffer: job commands, then 3 trailing feeds and a cut
///
/// Individual append failures are logged and skipped; the buffer build is
/// best-effort.
fn build_buffer(driver: &mut dyn DeviceDriver, commands: &[PrintCommand]) {
    for command in commands {
        if let Err(e) = driver.append_command(command) {
            warn!(error = %e, "Command append failed, skipping");
        }
    }

    for trailer in [
        PrintCommand::FeedLines(3),
        PrintCommand::Cut(CutMode::Full),
    ] {
        if let Err(e) = driver.append_command(&trailer) {
            warn!(error = %e, "Trailer append failed, skipping");
        }
    }
}

/// Main print protocol: connect, transact, status-gate, send, and tear
/// down on the job-finished event
async fn run_print(driver: &mut dyn DeviceDriver, target: &str) -> PrintResult<()> {
    enter(SessionState::Sending);
    driver.connect(target).await?;
    if let Err(e) = driver.begin_transaction().await {
        let _ = driver.disconnect().await;
        return Err(e);
    }

    enter(SessionState::StatusCheck);
    let status = driver.status().await?;
    if !status.is_printable() {
        let _ = driver.disconnect().await;
        return Err(PrintError::NotPrintable(target.to_string()));
    }

    enter(SessionState::Committing);
    if let Err(e) = driver.send().await {
        let _ = driver.disconnect().await;
        return Err(e);
    }

    // The finished event is the only successful path back to idle
    enter(SessionState::Disconnecting);
    driver.wait_job_finished().await?;
    driver.end_transaction().await?;
    driver.disconnect().await?;

    info!(target = %target, "Print job finished");
    Ok(())
}
