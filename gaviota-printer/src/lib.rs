//! # gaviota-printer
//!
//! Thermal printer device layer - command primitives and serialized
//! device sessions.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - [`PrintCommand`] primitives (the unit a driver consumes)
//! - ESC/POS translation and Windows-1252 encoding
//! - The [`DeviceDriver`] seam (network transport included)
//! - The [`PrintSessionManager`] worker that serializes all device jobs
//!
//! Ticket semantics (WHAT to print) live in `gaviota-ticket`.
//!
//! ## Example
//!
//! ```ignore
//! use gaviota_printer::{NetworkDriver, PrintCommand, PrintSessionManager};
//!
//! let manager = PrintSessionManager::new(Box::new(NetworkDriver::new()));
//! manager.submit_job(
//!     "TCP:192.168.1.100",
//!     vec![PrintCommand::AppendText("Merry Christmas".into())],
//!     false,
//!     Some(Box::new(|success| println!("printed: {success}"))),
//! )?;
//! ```

mod command;
mod driver;
mod encoding;
mod error;
mod escpos;
mod session;

// Re-exports
pub use command::{Alignment, CutMode, PrintCommand, RasterImage};
pub use driver::{DeviceDriver, DeviceStatus, NetworkDriver};
pub use encoding::{convert_to_cp1252, pad_text, text_width, truncate_text};
pub use error::{PrintError, PrintResult};
pub use escpos::{encode_command, encode_commands};
pub use session::{JobCallback, PrintSessionManager};
