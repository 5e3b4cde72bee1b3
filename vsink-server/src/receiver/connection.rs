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
use super::io::AbstractIO;
use vsink_common::re::{anyhow, log};
use vsink_common::SMTPReplyCode;
use vsink_config::{log_channel, Config};
use vsink_store::User;

/// Instance containing connection to the server's information
pub struct Connection<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin,
{
    /// connection timestamp
    pub timestamp: std::time::SystemTime,
    /// is still alive
    pub is_alive: bool,
    /// server's configuration
    pub config: std::sync::Arc<Config>,
    /// peer socket address
    pub client_addr: std::net::SocketAddr,
    /// number of error the client made so far
    pub error_count: i64,
    /// has completed an AUTH exchange
    pub is_authenticated: bool,
    /// account bound by the AUTH exchange
    pub user: Option<User>,
    /// number of times an AUTH exchange was canceled
    pub authentication_attempt: i64,
    /// abstraction of the stream
    pub inner: AbstractIO<S>,
}

impl<S> Connection<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin,
{
    ///
    pub fn new(
        client_addr: std::net::SocketAddr,
        config: std::sync::Arc<Config>,
        inner: S,
    ) -> Self {
        Self {
            timestamp: std::time::SystemTime::now(),
            is_alive: true,
            config,
            client_addr,
            error_count: 0,
            is_authenticated: false,
            user: None,
            authentication_attempt: 0,
            inner: AbstractIO::new(inner),
        }
    }

    /// send a reply code to the client
    ///
    /// error codes feed the per-connection error counter: past the soft
    /// threshold replies are delayed, past the hard threshold the reply is
    /// folded with a 451 and the connection is dropped.
    ///
    /// # Errors
    ///
    /// * the connection writer failed
    /// * the hard error count was reached
    pub async fn send_code(&mut self, reply_to_send: SMTPReplyCode) -> anyhow::Result<()> {
        log::info!(
            target: log_channel::CONNECTION,
            "sending code={:?}",
            reply_to_send
        );

        let reply = self.config.reply_text(reply_to_send);
        if reply_to_send.is_error() {
            self.error_count += 1;

            let hard_error = self.config.server.smtp.error.hard_count;
            let soft_error = self.config.server.smtp.error.soft_count;

            if hard_error != -1 && self.error_count >= hard_error {
                let mut response_begin = reply;
                response_begin.replace_range(3..4, "-");
                response_begin
                    .push_str(&self.config.reply_text(SMTPReplyCode::Code451TooManyError));
                self.send(&response_begin).await?;

                anyhow::bail!("too many errors")
            }

            self.send(&reply).await?;

            if soft_error != -1 && self.error_count >= soft_error {
                tokio::time::sleep(self.config.server.smtp.error.delay).await;
            }
        } else {
            self.send(&reply).await?;
        }
        Ok(())
    }

    /// Send a buffer
    ///
    /// # Errors
    ///
    /// * internal connection writer error
    pub async fn send(&mut self, reply: &str) -> anyhow::Result<()> {
        log::info!(target: log_channel::CONNECTION, "send=\"{:?}\"", reply);

        tokio::io::AsyncWriteExt::write_all(&mut self.inner.inner, reply.as_bytes()).await?;
        tokio::io::AsyncWriteExt::flush(&mut self.inner.inner).await?;
        Ok(())
    }

    /// read a line from the client
    ///
    /// # Errors
    ///
    /// * timed-out
    /// * stream's error
    pub async fn read(
        &mut self,
        timeout: std::time::Duration,
    ) -> std::io::Result<Option<std::string::String>> {
        self.inner.next_line(Some(timeout)).await
    }
}
