//! vSink common definitions
//!
//! Protocol-level types shared by the vSink crates: SMTP reply codes,
//! command events, session states, AUTH mechanisms and the per-session
//! mail context.

#![doc(html_no_source)]
#![deny(missing_docs)]
//
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
//
#![allow(clippy::doc_markdown)]

mod address;
mod code;
mod envelop;
mod event;
mod mail_context;
mod mechanism;
mod simulation;
mod state;

pub use address::Address;
pub use code::SMTPReplyCode;
pub use envelop::Envelop;
pub use event::Event;
pub use mail_context::{MailContext, MessageMetadata, MAIL_CAPACITY};
pub use mechanism::Mechanism;
pub use simulation::SimulationMode;
pub use state::StateSMTP;

/// re-exported dependencies, pinned by this crate for the whole workspace
pub mod re {
    pub use anyhow;
    pub use log;
}
