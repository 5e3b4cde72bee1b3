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
use crate::receiver::{Connection, OnMail};
use crate::simulation::SimulationPolicy;
use vsink_common::re::{anyhow, log};
use vsink_common::{MailContext, SMTPReplyCode};
use vsink_config::log_channel::DELIVERY;
use vsink_mail_parser::MailMimeParser;
use vsink_store::{MessageStore, NewMessage, User, UserLookup};

/// Post-DATA processing: owner resolution, MIME parsing, validation,
/// simulation and persistence.
pub struct MailHandler {
    store: std::sync::Arc<dyn MessageStore>,
    users: std::sync::Arc<dyn UserLookup>,
    policy: std::sync::Arc<SimulationPolicy>,
}

impl MailHandler {
    ///
    #[must_use]
    pub fn new(
        store: std::sync::Arc<dyn MessageStore>,
        users: std::sync::Arc<dyn UserLookup>,
        policy: std::sync::Arc<SimulationPolicy>,
    ) -> Self {
        Self {
            store,
            users,
            policy,
        }
    }

    /// the account owning the captured message.
    ///
    /// an authenticated session owns its messages; otherwise the first
    /// recipient whose local-part matches a mailbox wins, with the
    /// configured root account as last resort.
    async fn resolve_owner<S>(
        &self,
        conn: &Connection<S>,
        mail: &MailContext,
    ) -> Option<User>
    where
        S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin,
    {
        if let Some(user) = &conn.user {
            return Some(user.clone());
        }

        for rcpt in &mail.envelop.rcpt {
            if let Ok(user) = self.users.by_mailbox(rcpt.local_part()).await {
                log::debug!(
                    target: DELIVERY,
                    "recipient '{}' routed to mailbox '{}'",
                    rcpt,
                    user.mailbox_name
                );
                return Some(user);
            }
        }

        self.users
            .by_username(&conn.config.app.root_username)
            .await
            .ok()
    }
}

#[async_trait::async_trait]
impl OnMail for MailHandler {
    async fn on_mail<S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Sync + Unpin>(
        &mut self,
        conn: &mut Connection<S>,
        mail: Box<MailContext>,
        helo_domain: &mut Option<String>,
    ) -> anyhow::Result<()> {
        if !mail.envelop.helo.is_empty() {
            *helo_domain = Some(mail.envelop.helo.clone());
        }

        if !mail.envelop.is_complete() {
            conn.send_code(SMTPReplyCode::Code550EnvelopeIncomplete).await?;
            return Ok(());
        }

        let user = match self.resolve_owner(conn, &mail).await {
            Some(user) => user,
            None => {
                conn.send_code(SMTPReplyCode::Code550NoMailbox).await?;
                return Ok(());
            }
        };

        let parsed = MailMimeParser::default().parse(mail.body.as_bytes());

        if parsed.text_body.is_empty() && parsed.html_body.is_empty() {
            conn.send_code(SMTPReplyCode::Code550EmptyBody).await?;
            return Ok(());
        }
        for attachment in &parsed.attachments {
            if attachment.filename.is_empty() {
                conn.send_code(SMTPReplyCode::Code550AttachmentFilename).await?;
                return Ok(());
            }
            if attachment.data.is_empty() {
                conn.send_code(SMTPReplyCode::Code550AttachmentContent).await?;
                return Ok(());
            }
        }

        let verdict = self.policy.evaluate();

        let mail_from = mail
            .envelop
            .mail_from
            .as_ref()
            .expect("envelope checked above")
            .full()
            .to_string();
        let rcpt = mail
            .envelop
            .rcpt
            .iter()
            .map(vsink_common::Address::full)
            .collect::<Vec<_>>()
            .join(", ");

        let message = match self
            .store
            .create_message(NewMessage {
                user_id: user.id,
                from: mail_from,
                to: rcpt,
                cc: parsed.cc,
                bcc: parsed.bcc,
                subject: parsed.subject,
                text_body: parsed.text_body,
                html_body: parsed.html_body,
                raw_content: mail.body,
                headers: parsed.headers,
            })
            .await
        {
            Ok(message) => message,
            Err(error) => {
                log::error!(target: DELIVERY, "could not store message: {}", error);
                conn.send_code(SMTPReplyCode::Code550StoreFailed).await?;
                return Ok(());
            }
        };

        for attachment in parsed.attachments {
            if let Err(error) = self
                .store
                .add_attachment(
                    message.id,
                    &attachment.filename,
                    &attachment.content_type,
                    attachment.data,
                )
                .await
            {
                // the message stays accepted, a lost attachment is logged.
                log::warn!(
                    target: DELIVERY,
                    "could not store attachment '{}' of message '{}': {}",
                    attachment.filename,
                    message.id,
                    error
                );
            }
        }

        match verdict.failure_reason() {
            None => {
                log::info!(target: DELIVERY, "message '{}' queued", message.id);
                conn.send_code(SMTPReplyCode::Code250Queued).await?;
            }
            Some(reason) => {
                if let Err(error) = self
                    .store
                    .update_message_status(message.id, verdict.status(), Some(reason))
                    .await
                {
                    log::error!(
                        target: DELIVERY,
                        "could not update status of message '{}': {}",
                        message.id,
                        error
                    );
                }
                log::info!(
                    target: DELIVERY,
                    "message '{}' stored with simulated verdict {:?}",
                    message.id,
                    verdict
                );
                conn.send(&format!("550 {}\r\n", reason)).await?;
            }
        }

        Ok(())
    }
}
