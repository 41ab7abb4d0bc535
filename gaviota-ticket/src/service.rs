//! Ticket print facade
//!
//! Wires the merge engine and line renderer to the device session
//! manager: one call takes a template model, a data record, and a target,
//! and queues the finished command list as a print job.

use crate::merge::{MergeDiagnostic, TicketMerger};
use crate::model::{DataRecord, TicketModel};
use crate::render::LineRenderer;
use gaviota_printer::{JobCallback, PrintResult, PrintSessionManager};
use std::sync::Arc;
use tracing::{info, instrument};

/// Character-grid parameters for a device class
///
/// The target string is only inspected to pick these; discovery and
/// addressing stay with the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceProfile {
    /// Ticket width in characters at font scale 1
    pub width_chars: usize,
    /// Per-column budget before item names split onto a second line
    pub max_line_chars: usize,
}

impl DeviceProfile {
    /// Derive the grid from the device class encoded in the target
    ///
    /// Bluetooth-class printers use narrow paper (40 characters, 48 for
    /// the TM-m30 class) and a 16-character item column; networked
    /// printers use 48 and 22.
    pub fn from_target(target: &str) -> Self {
        if target.contains("BT") {
            Self {
                width_chars: if target.contains("TM-m30") { 48 } else { 40 },
                max_line_chars: 16,
            }
        } else {
            Self {
                width_chars: 48,
                max_line_chars: 22,
            }
        }
    }
}

/// High-level entry point for printing tickets
///
/// Holds a shared [`PrintSessionManager`]; merge and render run on the
/// caller, only the device work is queued.
pub struct TicketPrintService {
    sessions: Arc<PrintSessionManager>,
}

impl TicketPrintService {
    pub fn new(sessions: Arc<PrintSessionManager>) -> Self {
        Self { sessions }
    }

    /// Merge, render, and queue one ticket
    ///
    /// Returns the merge diagnostics immediately; the device outcome
    /// arrives through `callback` once the queued job finishes.
    #[instrument(skip(self, model, data, callback), fields(target = %target))]
    pub fn print_ticket(
        &self,
        target: &str,
        model: &TicketModel,
        data: &DataRecord,
        open_drawer: bool,
        callback: Option<JobCallback>,
    ) -> PrintResult<Vec<MergeDiagnostic>> {
        let profile = DeviceProfile::from_target(target);

        let merged = TicketMerger::new(profile.max_line_chars).merge(model, data);
        let commands = LineRenderer::new(profile.width_chars).render(&merged.lines);

        info!(
            lines = merged.lines.len(),
            commands = commands.len(),
            diagnostics = merged.diagnostics.len(),
            "Ticket queued"
        );

        self.sessions
            .submit_job(target, commands, open_drawer, callback)?;
        Ok(merged.diagnostics)
    }

    /// Queue a drawer-open job without printing
    pub fn open_drawer(&self, target: &str, callback: Option<JobCallback>) -> PrintResult<()> {
        self.sessions.open_drawer(target, callback)
    }
}
