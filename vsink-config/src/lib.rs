//! vSink configuration
//!
//! TOML configuration of the server: listen address, SMTP limits and
//! timeouts, reply code table, logging and the capture application
//! settings (root account, simulation mode).

#![doc(html_no_source)]
#![deny(missing_docs)]
//
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
//
#![allow(clippy::doc_markdown)]

mod config;
mod default;
mod log4rs_helper;

/// targets of the log macros used by the server crates.
pub mod log_channel {
    /// the client transaction dialog.
    pub const RECEIVER: &str = "receiver";
    /// connection open/close and raw replies.
    pub const CONNECTION: &str = "connection";
    /// message processing after the DATA terminator.
    pub const DELIVERY: &str = "delivery";
}

pub use config::{
    Config, ConfigApp, ConfigServer, ConfigServerLogs, ConfigServerSMTP, ConfigServerSMTPError,
    ConfigServerSMTPTimeoutClient,
};
pub use log4rs_helper::get_log4rs_config;

/// re-exported dependencies, pinned by this crate for the whole workspace
pub mod re {
    pub use log4rs;
}
