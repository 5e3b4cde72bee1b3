//! vSink server
//!
//! The SMTP receiver of the vSink mail capture server: listener, session
//! state machine, AUTH exchange, post-DATA processing pipeline and the
//! delivery simulation policy.

#![doc(html_no_source)]
#![deny(missing_docs)]
//
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
//
#![allow(clippy::doc_markdown)]

mod handler;
mod receiver;
mod server;
mod simulation;

pub use handler::MailHandler;
pub use receiver::{handle_connection, AbstractIO, Connection, OnMail};
pub use server::Server;
pub use simulation::{SimulationPolicy, Verdict};

/// re-exported dependencies, pinned by this crate for the whole workspace
pub mod re {
    pub use tokio;
}
