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
#![allow(clippy::module_name_repetitions)]
#![allow(missing_docs)]

use vsink_common::{SMTPReplyCode, SimulationMode};

///
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub server: ConfigServer,
    #[serde(default)]
    pub app: ConfigApp,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigServer {
    #[serde(default = "ConfigServer::default_domain")]
    pub domain: String,
    #[serde(default = "ConfigServer::default_addr")]
    pub addr: std::net::SocketAddr,
    #[serde(default = "ConfigServer::default_client_count_max")]
    pub client_count_max: i64,
    #[serde(default = "ConfigServer::default_thread_count")]
    pub thread_count: usize,
    #[serde(default)]
    pub logs: ConfigServerLogs,
    #[serde(default)]
    pub smtp: ConfigServerSMTP,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigServerLogs {
    #[serde(default = "ConfigServerLogs::default_filepath")]
    pub filepath: std::path::PathBuf,
    #[serde(default = "ConfigServerLogs::default_format")]
    pub format: String,
    #[serde(default)]
    pub level: std::collections::BTreeMap<String, log::LevelFilter>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigServerSMTPError {
    pub soft_count: i64,
    pub hard_count: i64,
    #[serde(with = "humantime_serde")]
    pub delay: std::time::Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigServerSMTPTimeoutClient {
    #[serde(with = "humantime_serde")]
    pub connect: std::time::Duration,
    #[serde(with = "humantime_serde")]
    pub helo: std::time::Duration,
    #[serde(with = "humantime_serde")]
    pub mail_from: std::time::Duration,
    #[serde(with = "humantime_serde")]
    pub rcpt_to: std::time::Duration,
    #[serde(with = "humantime_serde")]
    pub data: std::time::Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigServerSMTP {
    #[serde(default = "ConfigServerSMTP::default_rcpt_count_max")]
    pub rcpt_count_max: usize,
    #[serde(default)]
    pub error: ConfigServerSMTPError,
    #[serde(default)]
    pub timeout_client: ConfigServerSMTPTimeoutClient,
    /// replies sent for each code, merged over the built-in table.
    /// `{domain}` is substituted with `server.domain` at send time.
    #[serde(default)]
    pub codes: std::collections::BTreeMap<SMTPReplyCode, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigApp {
    /// account owning messages whose recipients match no mailbox.
    #[serde(default = "ConfigApp::default_root_username")]
    pub root_username: String,
    #[serde(default = "ConfigApp::default_root_password")]
    pub root_password: String,
    #[serde(default = "ConfigApp::default_root_email")]
    pub root_email: String,
    /// initial delivery simulation mode.
    #[serde(default)]
    pub simulation_mode: SimulationMode,
}

impl Config {
    /// Build a configuration from its TOML representation. Missing fields
    /// get their defaults, missing reply codes are filled from the
    /// built-in table.
    ///
    /// # Errors
    ///
    /// * the TOML is syntactically or structurally invalid
    pub fn from_toml(input: &str) -> anyhow::Result<Self> {
        let mut config = toml::from_str::<Self>(input)?;
        config.ensure_codes();
        Ok(config)
    }

    /// Complete the reply code table with the built-in texts.
    pub fn ensure_codes(&mut self) {
        for (code, text) in crate::default::default_smtp_codes() {
            self.server.smtp.codes.entry(code).or_insert(text);
        }
    }

    /// The reply text of a code.
    ///
    /// # Panics
    ///
    /// * the code table is incomplete, meaning the config was built
    ///   without [`Config::ensure_codes`]
    #[must_use]
    pub fn reply_text(&self, code: SMTPReplyCode) -> String {
        self.server
            .smtp
            .codes
            .get(&code)
            .unwrap_or_else(|| panic!("missing reply text for code {}", code))
            .replace("{domain}", &self.server.domain)
    }
}
