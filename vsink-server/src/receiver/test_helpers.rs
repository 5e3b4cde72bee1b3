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
use crate::receiver::{handle_connection, Connection, OnMail};
use vsink_common::re::anyhow;
use vsink_config::Config;
use vsink_store::{MemoryStore, User, UserLookup, UserRole};

/// A type implementing AsyncRead+AsyncWrite to emulate sockets
pub struct Mock<'a, T: AsRef<[u8]> + Unpin> {
    read_cursor: std::io::Cursor<T>,
    write_cursor: std::io::Cursor<&'a mut Vec<u8>>,
}

impl<'a, T: AsRef<[u8]> + Unpin> Mock<'a, T> {
    /// Create an new instance
    pub fn new(read: T, write: &'a mut Vec<u8>) -> Self {
        Self {
            read_cursor: std::io::Cursor::new(read),
            write_cursor: std::io::Cursor::new(write),
        }
    }
}

impl<T: AsRef<[u8]> + Unpin> tokio::io::AsyncRead for Mock<'_, T> {
    fn poll_read(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::result::Result<(), std::io::Error>> {
        std::pin::Pin::new(&mut self.read_cursor).poll_read(cx, buf)
    }
}

impl<T: AsRef<[u8]> + Unpin> tokio::io::AsyncWrite for Mock<'_, T> {
    fn poll_write(
        mut self: std::pin::Pin<&mut Self>,
        _: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<Result<usize, std::io::Error>> {
        std::task::Poll::Ready(std::io::Write::write(&mut self.write_cursor, buf))
    }

    fn poll_flush(
        mut self: std::pin::Pin<&mut Self>,
        _: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), std::io::Error>> {
        std::task::Poll::Ready(std::io::Write::flush(&mut self.write_cursor))
    }

    fn poll_shutdown(
        self: std::pin::Pin<&mut Self>,
        _: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), std::io::Error>> {
        std::task::Poll::Ready(Ok(()))
    }
}

/// configuration used by the receiver tests.
#[must_use]
pub fn local_test_config() -> Config {
    let mut config = Config::default();
    config.server.domain = "testserver.com".to_string();
    // keep the transcripts deterministic
    config.server.smtp.error.soft_count = -1;
    config.server.smtp.error.hard_count = -1;
    config
}

/// a directory with the root account and one regular mailbox.
#[must_use]
pub fn fixture_store() -> std::sync::Arc<MemoryStore> {
    let store = MemoryStore::with_root("admin", "admin123", "admin@testserver.com");
    store.add_user(User {
        id: uuid::Uuid::new_v4(),
        username: "john.doe".to_string(),
        password_hash: "secret".to_string(),
        email: "john.doe@testserver.com".to_string(),
        role: UserRole::User,
        mailbox_name: "jdoe".to_string(),
        active: true,
    });
    std::sync::Arc::new(store)
}

/// run a connection and assert the output produced against
/// @expected_output
///
/// # Errors
///
/// * the outcome of [`handle_connection`]
///
/// # Panics
///
/// * argument provided are ill-formed
pub async fn test_receiver_inner<M>(
    address: &str,
    mail_handler: &mut M,
    users: std::sync::Arc<dyn UserLookup>,
    smtp_input: &[u8],
    expected_output: &[u8],
    config: std::sync::Arc<Config>,
) -> anyhow::Result<()>
where
    M: OnMail + Send,
{
    let mut written_data = Vec::new();
    let mock = Mock::new(smtp_input.to_vec(), &mut written_data);
    let mut conn = Connection::new(address.parse().unwrap(), config, mock);

    let result = handle_connection(&mut conn, users, mail_handler).await;
    drop(conn);

    assert_eq!(
        std::str::from_utf8(expected_output),
        std::str::from_utf8(&written_data),
    );

    result
}

/// Call `test_receiver_inner` with the default fixtures
#[macro_export]
macro_rules! test_receiver {
    ($input:expr, $output:expr) => {{
        let store = $crate::receiver::test_helpers::fixture_store();
        let mut handler = $crate::MailHandler::new(
            store.clone(),
            store.clone(),
            std::sync::Arc::new($crate::SimulationPolicy::new(
                vsink_common::SimulationMode::Success,
            )),
        );
        test_receiver! {
            on_mail => &mut handler,
            with_users => store,
            $input,
            $output
        }
    }};
    (on_mail => $handler:expr, with_users => $users:expr, $input:expr, $output:expr) => {
        test_receiver! {
            on_mail => $handler,
            with_users => $users,
            with_config => $crate::receiver::test_helpers::local_test_config(),
            $input,
            $output
        }
    };
    (on_mail => $handler:expr, with_users => $users:expr, with_config => $config:expr, $input:expr, $output:expr) => {
        $crate::receiver::test_helpers::test_receiver_inner(
            "127.0.0.1:53844",
            $handler,
            $users,
            $input.as_bytes(),
            $output.as_bytes(),
            std::sync::Arc::new($config),
        )
        .await
    };
}
