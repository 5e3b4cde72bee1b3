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
use crate::handler::MailHandler;
use crate::receiver::{handle_connection, Connection};
use crate::simulation::SimulationPolicy;
use vsink_common::re::{anyhow, log};
use vsink_common::SMTPReplyCode;
use vsink_config::Config;
use vsink_store::{MessageStore, UserLookup};

/// window left to in-flight sessions when a shutdown signal arrives.
const SHUTDOWN_DRAIN: std::time::Duration = std::time::Duration::from_secs(5);

/// TCP/IP server
pub struct Server {
    listener: tokio::net::TcpListener,
    config: std::sync::Arc<Config>,
    store: std::sync::Arc<dyn MessageStore>,
    users: std::sync::Arc<dyn UserLookup>,
    policy: std::sync::Arc<SimulationPolicy>,
}

impl Server {
    /// Create a server with the configuration provided, and the socket
    /// already bound
    ///
    /// # Errors
    ///
    /// * cannot convert the socket to [`tokio::net::TcpListener`]
    pub fn new(
        config: std::sync::Arc<Config>,
        socket: std::net::TcpListener,
        store: std::sync::Arc<dyn MessageStore>,
        users: std::sync::Arc<dyn UserLookup>,
        policy: std::sync::Arc<SimulationPolicy>,
    ) -> anyhow::Result<Self> {
        socket.set_nonblocking(true)?;
        Ok(Self {
            listener: tokio::net::TcpListener::from_std(socket)?,
            config,
            store,
            users,
            policy,
        })
    }

    /// Get the local address of the tcp listener
    ///
    /// # Panics
    ///
    /// * the local address cannot be retrieved
    #[must_use]
    pub fn addr(&self) -> std::net::SocketAddr {
        self.listener
            .local_addr()
            .expect("cannot retrieve local address")
    }

    /// Main loop of the server: accept until a shutdown signal, then give
    /// in-flight sessions a short drain window.
    ///
    /// # Errors
    ///
    /// * the signal handlers could not be installed
    pub async fn listen_and_serve(&self) -> anyhow::Result<()> {
        let client_counter = std::sync::Arc::new(std::sync::atomic::AtomicI64::new(0));
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                _ = tokio::signal::ctrl_c() => break,
                _ = sigterm.recv() => break,
            };

            let (mut stream, client_addr) = match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    log::error!("Error accepting connection: {}", e);
                    continue;
                }
            };
            log::warn!("Connection from: {}", client_addr);

            if self.config.server.client_count_max != -1
                && client_counter.load(std::sync::atomic::Ordering::SeqCst)
                    >= self.config.server.client_count_max
            {
                if let Err(e) = tokio::io::AsyncWriteExt::write_all(
                    &mut stream,
                    self.config
                        .reply_text(SMTPReplyCode::Code554ConnectionMaxReached)
                        .as_bytes(),
                )
                .await
                {
                    log::warn!("{}", e);
                }

                if let Err(e) = tokio::io::AsyncWriteExt::shutdown(&mut stream).await {
                    log::warn!("{}", e);
                }
                continue;
            }

            client_counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

            let session = Self::run_session(
                stream,
                client_addr,
                self.config.clone(),
                self.store.clone(),
                self.users.clone(),
                self.policy.clone(),
            );
            let client_counter_copy = client_counter.clone();
            tokio::spawn(async move {
                if let Err(e) = session.await {
                    log::warn!("{}", e);
                }

                client_counter_copy.fetch_sub(1, std::sync::atomic::Ordering::SeqCst);
            });
        }

        log::warn!(
            "Shutdown requested, draining {} session(s)",
            client_counter.load(std::sync::atomic::Ordering::SeqCst)
        );
        let deadline = std::time::Instant::now() + SHUTDOWN_DRAIN;
        while client_counter.load(std::sync::atomic::Ordering::SeqCst) > 0
            && std::time::Instant::now() < deadline
        {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }

        Ok(())
    }

    pub(crate) async fn run_session(
        stream: tokio::net::TcpStream,
        client_addr: std::net::SocketAddr,
        config: std::sync::Arc<Config>,
        store: std::sync::Arc<dyn MessageStore>,
        users: std::sync::Arc<dyn UserLookup>,
        policy: std::sync::Arc<SimulationPolicy>,
    ) -> anyhow::Result<()> {
        let begin = std::time::SystemTime::now();
        log::warn!("Handling client: {}", client_addr);

        let mut conn = Connection::new(client_addr, config, stream);
        let mut mail_handler = MailHandler::new(store, users.clone(), policy);

        handle_connection(&mut conn, users, &mut mail_handler)
            .await
            .map(|_| {
                log::warn!(
                    "{{ elapsed: {:?} }} Connection {} closed cleanly",
                    begin.elapsed(),
                    client_addr,
                );
            })
            .map_err(|error| {
                log::error!(
                    "{{ elapsed: {:?} }} Connection {} closed with an error {}",
                    begin.elapsed(),
                    client_addr,
                    error,
                );
                error
            })
    }
}
