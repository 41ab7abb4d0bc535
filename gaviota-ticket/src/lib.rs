//! # gaviota-ticket
//!
//! Ticket rendering layer - template/data merging and fixed-width layout.
//!
//! ## Scope
//!
//! This crate decides WHAT to print:
//! - [`TicketModel`] / [`DataRecord`]: static line templates and the
//!   concrete values for one print
//! - [`TicketMerger`]: resolves templates against data into
//!   [`RenderableLine`]s
//! - [`LineRenderer`]: turns lines into `gaviota-printer` commands
//! - [`TicketPrintService`]: the one-call facade over the device session
//!
//! Device transport and job serialization live in `gaviota-printer`.
//!
//! ## Example
//!
//! ```ignore
//! use gaviota_printer::{NetworkDriver, PrintSessionManager};
//! use gaviota_ticket::{DataRecord, TicketModel, TicketPrintService};
//! use std::sync::Arc;
//!
//! let model = TicketModel::from_json(include_str!("../tickets/photo.json"))?;
//! let mut data = DataRecord::new();
//! data.insert_text("message", "Merry Christmas");
//!
//! let sessions = Arc::new(PrintSessionManager::new(Box::new(NetworkDriver::new())));
//! let service = TicketPrintService::new(sessions);
//! service.print_ticket("TCP:192.168.1.100", &model, &data, true, None)?;
//! ```

mod layout;
mod merge;
mod model;
mod render;
mod service;

// Re-exports
pub use layout::{compute_column_spacing, fill_background, pad_for_alignment, wrap_long_line};
pub use merge::{
    LinePayload, LineStyle, MergeDiagnostic, MergedTicket, RenderableLine, TicketMerger,
};
pub use model::{DataRecord, LineTemplate, LineType, TicketModel, TicketValue};
pub use render::{LineRenderer, RenderDiagnostic};
pub use service::{DeviceProfile, TicketPrintService};

// The alignment type is shared with the device layer
pub use gaviota_printer::Alignment;
