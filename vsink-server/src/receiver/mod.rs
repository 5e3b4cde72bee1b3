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
use self::auth_exchange::{on_authentication, AuthExchangeError};
use self::transaction::{Transaction, TransactionResult};
use vsink_common::re::{anyhow, log};
use vsink_common::{MailContext, SMTPReplyCode};
use vsink_config::log_channel::RECEIVER;
use vsink_store::UserLookup;

mod auth_exchange;
mod connection;
mod io;
pub(crate) mod transaction;

pub use connection::Connection;
pub use io::AbstractIO;

#[cfg(test)]
mod tests;

/// boilerplate for the tests
#[cfg(test)]
pub mod test_helpers;

/// will be executed once the email is received.
#[async_trait::async_trait]
pub trait OnMail {
    /// the server executes this function once a full email has been received.
    async fn on_mail<S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Sync + Unpin>(
        &mut self,
        conn: &mut Connection<S>,
        mail: Box<MailContext>,
        helo_domain: &mut Option<String>,
    ) -> anyhow::Result<()>;
}

/// Receives the incoming mail of a connection
///
/// # Errors
///
/// * server failed to send a message
/// * a transaction failed
/// * the processing of a mail failed
pub async fn handle_connection<S, M>(
    conn: &mut Connection<S>,
    users: std::sync::Arc<dyn UserLookup>,
    mail_handler: &mut M,
) -> anyhow::Result<()>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Sync + Unpin,
    M: OnMail + Send,
{
    let mut helo_domain = None;

    conn.send_code(SMTPReplyCode::Greetings).await?;

    while conn.is_alive {
        match Transaction::receive(conn, &helo_domain).await? {
            TransactionResult::Nothing => {}
            TransactionResult::Mail(mail) => {
                mail_handler.on_mail(conn, mail, &mut helo_domain).await?;
            }
            TransactionResult::Authentication(helo_pre_auth, mechanism, initial_response) => {
                if !helo_pre_auth.is_empty() {
                    helo_domain = Some(helo_pre_auth);
                }

                match on_authentication(conn, users.clone(), mechanism, initial_response).await {
                    Ok(user) => {
                        log::info!(
                            target: RECEIVER,
                            "client authenticated as '{}'",
                            user.username
                        );
                        conn.is_authenticated = true;
                        conn.user = Some(user);
                        conn.send_code(SMTPReplyCode::Code235).await?;
                    }
                    // no partial state: the session simply stays
                    // unauthenticated and the dialog continues.
                    Err(AuthExchangeError::Failed) => {
                        conn.authentication_attempt += 1;
                        conn.send_code(SMTPReplyCode::Code535).await?;
                    }
                    Err(AuthExchangeError::InvalidBase64) => {
                        conn.authentication_attempt += 1;
                        conn.send_code(SMTPReplyCode::Code535).await?;
                    }
                    Err(AuthExchangeError::Canceled) => {
                        conn.authentication_attempt += 1;
                        conn.send_code(SMTPReplyCode::Code501AuthCanceled).await?;
                    }
                    Err(AuthExchangeError::Other(e)) => anyhow::bail!(e),
                }
            }
        }
    }

    Ok(())
}
