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
use super::connection::Connection;
use vsink_common::re::{anyhow, log};
use vsink_common::{Mechanism, SMTPReplyCode};
use vsink_config::log_channel::RECEIVER;
use vsink_store::{User, UserLookup};

const CHALLENGE_USERNAME: &str = "334 VXNlcm5hbWU6\r\n"; // "Username:"
const CHALLENGE_PASSWORD: &str = "334 UGFzc3dvcmQ6\r\n"; // "Password:"

const READ_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

/// Result of the AUTH command
#[must_use]
pub enum AuthExchangeError {
    /// authentication invalid
    Failed,
    /// the client stopped the exchange with "*"
    Canceled,
    /// the base64 of a challenge response did not decode
    InvalidBase64,
    /// timeout or i/o failure of the server
    Other(anyhow::Error),
}

fn decode_base64_utf8(buffer: &str) -> Result<String, AuthExchangeError> {
    let bytes = base64::decode(buffer.trim()).map_err(|_| AuthExchangeError::InvalidBase64)?;
    String::from_utf8(bytes).map_err(|_| AuthExchangeError::InvalidBase64)
}

async fn read_challenge_response<S>(
    conn: &mut Connection<S>,
    challenge: &str,
) -> Result<String, AuthExchangeError>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin,
{
    conn.send(challenge).await.map_err(AuthExchangeError::Other)?;

    match conn.read(READ_TIMEOUT).await {
        Ok(Some(buffer)) if buffer == "*" => Err(AuthExchangeError::Canceled),
        Ok(Some(buffer)) => Ok(buffer),
        Ok(None) => Err(AuthExchangeError::Other(anyhow::anyhow!(
            "eof during authentication exchange"
        ))),
        Err(e) => Err(AuthExchangeError::Other(anyhow::anyhow!(e))),
    }
}

/// Run one AUTH exchange and verify the credentials against the user
/// directory.
///
/// # Errors
///
/// * the mechanism dialog failed (base64, cancellation, i/o)
/// * the credentials are invalid
pub async fn on_authentication<S>(
    conn: &mut Connection<S>,
    users: std::sync::Arc<dyn UserLookup>,
    mechanism: Mechanism,
    initial_response: Option<String>,
) -> Result<User, AuthExchangeError>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin,
{
    let (username, password) = match mechanism {
        Mechanism::Plain => {
            let response = match initial_response {
                Some(response) => response,
                None => {
                    let challenge = conn.config.reply_text(SMTPReplyCode::Code334);
                    read_challenge_response(conn, &challenge).await?
                }
            };

            // RFC 4616: authzid NUL authcid NUL passwd
            let decoded = decode_base64_utf8(&response)?;
            let mut fields = decoded.split('\0');
            match (fields.next(), fields.next(), fields.next()) {
                (Some(_authzid), Some(authcid), Some(passwd)) => {
                    (authcid.to_string(), passwd.to_string())
                }
                _ => return Err(AuthExchangeError::Failed),
            }
        }
        Mechanism::Login => {
            if initial_response.is_some() {
                // LOGIN is a server-first mechanism.
                return Err(AuthExchangeError::Failed);
            }
            let username =
                decode_base64_utf8(&read_challenge_response(conn, CHALLENGE_USERNAME).await?)?;
            let password =
                decode_base64_utf8(&read_challenge_response(conn, CHALLENGE_PASSWORD).await?)?;
            (username, password)
        }
    };

    log::debug!(target: RECEIVER, "verifying credentials of '{}'", username);

    match users.authenticate(&username, &password).await {
        Ok(user) => Ok(user),
        Err(error) => {
            log::warn!(
                target: RECEIVER,
                "authentication failed for '{}': {}",
                username,
                error
            );
            Err(AuthExchangeError::Failed)
        }
    }
}
