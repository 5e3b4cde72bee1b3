/*
 * vSink mail capture server
 * Copyright (C) 2022 the vSink authors
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/
use crate::envelop::Envelop;

/// average size of a mail, used as the initial capacity of the DATA buffer
pub const MAIL_CAPACITY: usize = 10_000_000; // 10MB

/// metadata created when the envelope sender is set
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MessageMetadata {
    /// instant when the MAIL FROM command was received.
    pub timestamp: std::time::SystemTime,
    /// unique id generated for the incoming message.
    pub message_id: String,
}

impl MessageMetadata {
    /// Generate a new metadata block with a process-unique message id.
    #[must_use]
    pub fn new(connection_timestamp: std::time::SystemTime) -> Self {
        let now = std::time::SystemTime::now();
        Self {
            timestamp: now,
            message_id: format!(
                "{}{}{}{}",
                now.duration_since(std::time::SystemTime::UNIX_EPOCH)
                    .unwrap_or(std::time::Duration::ZERO)
                    .as_micros(),
                connection_timestamp
                    .duration_since(std::time::SystemTime::UNIX_EPOCH)
                    .unwrap_or(std::time::Duration::ZERO)
                    .as_millis(),
                std::iter::repeat_with(fastrand::alphanumeric)
                    .take(36)
                    .collect::<String>(),
                std::process::id()
            ),
        }
    }
}

/// Everything the session accumulated for one message.
///
/// The session exclusively owns its context until the DATA terminator; the
/// completed context is then moved out to the mail handler.
#[derive(Clone, Debug)]
pub struct MailContext {
    /// instant when the connection was accepted.
    pub connection_timestamp: std::time::SystemTime,
    /// address of the client.
    pub client_addr: std::net::SocketAddr,
    /// the envelope of the message.
    pub envelop: Envelop,
    /// raw DATA content, dot-stuffing already removed, lines CRLF terminated.
    pub body: String,
    /// set once MAIL FROM has been received.
    pub metadata: Option<MessageMetadata>,
}

impl MailContext {
    /// fresh context for a new transaction on the same connection.
    #[must_use]
    pub fn new(client_addr: std::net::SocketAddr, connection_timestamp: std::time::SystemTime) -> Self {
        Self {
            connection_timestamp,
            client_addr,
            envelop: Envelop::default(),
            body: String::new(),
            metadata: None,
        }
    }
}
