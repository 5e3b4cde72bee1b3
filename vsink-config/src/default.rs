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
use vsink_common::SMTPReplyCode;

use crate::config::{
    Config, ConfigApp, ConfigServer, ConfigServerLogs, ConfigServerSMTP, ConfigServerSMTPError,
    ConfigServerSMTPTimeoutClient,
};

impl Default for Config {
    fn default() -> Self {
        let mut config = Self {
            server: ConfigServer::default(),
            app: ConfigApp::default(),
        };
        config.ensure_codes();
        config
    }
}

impl Default for ConfigServer {
    fn default() -> Self {
        Self {
            domain: Self::default_domain(),
            addr: Self::default_addr(),
            client_count_max: Self::default_client_count_max(),
            thread_count: Self::default_thread_count(),
            logs: ConfigServerLogs::default(),
            smtp: ConfigServerSMTP::default(),
        }
    }
}

impl ConfigServer {
    pub(crate) fn default_domain() -> String {
        "localhost".to_string()
    }

    pub(crate) fn default_addr() -> std::net::SocketAddr {
        "0.0.0.0:1025".parse().expect("valid address")
    }

    pub(crate) const fn default_client_count_max() -> i64 {
        256
    }

    pub(crate) fn default_thread_count() -> usize {
        num_cpus::get()
    }
}

impl Default for ConfigServerLogs {
    fn default() -> Self {
        Self {
            filepath: Self::default_filepath(),
            format: Self::default_format(),
            level: std::collections::BTreeMap::default(),
        }
    }
}

impl ConfigServerLogs {
    pub(crate) fn default_filepath() -> std::path::PathBuf {
        "./vsink.log".into()
    }

    pub(crate) fn default_format() -> String {
        "{d} {l} - {m}{n}".to_string()
    }
}

impl Default for ConfigServerSMTPError {
    fn default() -> Self {
        Self {
            soft_count: 10,
            hard_count: 20,
            delay: std::time::Duration::from_millis(5000),
        }
    }
}

impl Default for ConfigServerSMTPTimeoutClient {
    fn default() -> Self {
        // generous values, the clients under test may stall between
        // commands while a developer steps through them.
        Self {
            connect: std::time::Duration::from_secs(5 * 60),
            helo: std::time::Duration::from_secs(5 * 60),
            mail_from: std::time::Duration::from_secs(5 * 60),
            rcpt_to: std::time::Duration::from_secs(5 * 60),
            data: std::time::Duration::from_secs(10 * 60),
        }
    }
}

impl Default for ConfigServerSMTP {
    fn default() -> Self {
        Self {
            rcpt_count_max: Self::default_rcpt_count_max(),
            error: ConfigServerSMTPError::default(),
            timeout_client: ConfigServerSMTPTimeoutClient::default(),
            codes: default_smtp_codes(),
        }
    }
}

impl ConfigServerSMTP {
    pub(crate) const fn default_rcpt_count_max() -> usize {
        1000
    }
}

impl Default for ConfigApp {
    fn default() -> Self {
        Self {
            root_username: Self::default_root_username(),
            root_password: Self::default_root_password(),
            root_email: Self::default_root_email(),
            simulation_mode: vsink_common::SimulationMode::default(),
        }
    }
}

impl ConfigApp {
    pub(crate) fn default_root_username() -> String {
        "admin".to_string()
    }

    pub(crate) fn default_root_password() -> String {
        "admin123".to_string()
    }

    pub(crate) fn default_root_email() -> String {
        "admin@localhost".to_string()
    }
}

/// the built-in reply texts, `{domain}` substituted at send time.
pub(crate) fn default_smtp_codes() -> std::collections::BTreeMap<SMTPReplyCode, String> {
    let codes: [(SMTPReplyCode, &str); 24] = [
        (SMTPReplyCode::Greetings, "220 {domain} ESMTP vSink\r\n"),
        (SMTPReplyCode::Code221, "221 Bye\r\n"),
        (SMTPReplyCode::Code235, "235 Authentication successful\r\n"),
        (SMTPReplyCode::Code250, "250 OK\r\n"),
        (SMTPReplyCode::Code250Helo, "250 Hello, pleased to meet you\r\n"),
        (
            SMTPReplyCode::Code250Ehlo,
            "250-Hello, pleased to meet you\r\n250 AUTH PLAIN LOGIN\r\n",
        ),
        (SMTPReplyCode::Code250Queued, "250 OK: Message queued\r\n"),
        (SMTPReplyCode::Code334, "334 \r\n"),
        (
            SMTPReplyCode::Code354,
            "354 End data with <CR><LF>.<CR><LF>\r\n",
        ),
        (
            SMTPReplyCode::Code451Timeout,
            "451 Timeout - closing connection\r\n",
        ),
        (
            SMTPReplyCode::Code451TooManyError,
            "451 Too many errors from the client\r\n",
        ),
        (
            SMTPReplyCode::Code452TooManyRecipients,
            "452 Requested action not taken: too many recipients\r\n",
        ),
        (SMTPReplyCode::Code500, "500 Command not recognized\r\n"),
        (SMTPReplyCode::Code501, "501 Syntax error in parameters\r\n"),
        (
            SMTPReplyCode::Code501AuthCanceled,
            "501 Authentication canceled by client\r\n",
        ),
        (
            SMTPReplyCode::Code504,
            "504 Unsupported authentication type\r\n",
        ),
        (SMTPReplyCode::Code535, "535 Authentication failed\r\n"),
        (
            SMTPReplyCode::Code550EnvelopeIncomplete,
            "550 No valid sender or recipient\r\n",
        ),
        (
            SMTPReplyCode::Code550NoMailbox,
            "550 No valid mailbox found\r\n",
        ),
        (
            SMTPReplyCode::Code550EmptyBody,
            "550 Message rejected: Email must contain either text/plain or text/html content\r\n",
        ),
        (
            SMTPReplyCode::Code550AttachmentFilename,
            "550 Message rejected: Attachments must have a filename\r\n",
        ),
        (
            SMTPReplyCode::Code550AttachmentContent,
            "550 Message rejected: Attachments must have content\r\n",
        ),
        (
            SMTPReplyCode::Code550StoreFailed,
            "550 Failed to store message\r\n",
        ),
        (
            SMTPReplyCode::Code554ConnectionMaxReached,
            "554 Cannot process connection, closing\r\n",
        ),
    ];

    codes
        .into_iter()
        .map(|(code, text)| (code, text.to_string()))
        .collect()
}
