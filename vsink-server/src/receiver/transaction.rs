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
use vsink_common::{
    Envelop, Event, MailContext, Mechanism, MessageMetadata, SMTPReplyCode, StateSMTP,
};
use vsink_config::log_channel::RECEIVER;
use vsink_config::Config;

pub struct Transaction {
    state: StateSMTP,
    ctx: MailContext,
    rcpt_count_max: usize,
}

#[allow(clippy::module_name_repetitions)]
pub enum TransactionResult {
    Nothing,
    Mail(Box<MailContext>),
    Authentication(String, Mechanism, Option<String>),
}

/// Generated from a string received
enum ProcessedEvent {
    Nothing,
    Reply(SMTPReplyCode),
    ChangeState(StateSMTP),
    ReplyChangeState(StateSMTP, SMTPReplyCode),
    TransactionCompleted(Box<MailContext>),
}

impl Transaction {
    fn parse_and_apply_and_get_reply(&mut self, client_message: &str) -> ProcessedEvent {
        log::trace!(target: RECEIVER, "buffer=\"{}\"", client_message);

        let command_or_code = if self.state == StateSMTP::Data {
            Event::parse_data
        } else {
            Event::parse_cmd
        }(client_message);

        log::trace!(target: RECEIVER, "parsed=\"{:?}\"", command_or_code);

        command_or_code.map_or_else(ProcessedEvent::Reply, |command| self.process_event(command))
    }

    // The dispatch deliberately accepts MAIL/RCPT/DATA out of their
    // canonical order, the envelope is validated after the DATA
    // terminator. Clients under test get away with sloppy dialogs, the
    // capture still refuses incomplete envelopes.
    fn process_event(&mut self, event: Event) -> ProcessedEvent {
        match (&self.state, event) {
            (_, Event::NoopCmd) => ProcessedEvent::Reply(SMTPReplyCode::Code250),

            (_, Event::RsetCmd) => {
                self.ctx.body.clear();
                self.ctx.metadata = None;
                self.ctx.envelop.rcpt.clear();
                self.ctx.envelop.mail_from = None;

                ProcessedEvent::ReplyChangeState(StateSMTP::Helo, SMTPReplyCode::Code250)
            }

            (_, Event::QuitCmd) => {
                ProcessedEvent::ReplyChangeState(StateSMTP::Stop, SMTPReplyCode::Code221)
            }

            (_, Event::HeloCmd(helo)) => {
                self.set_helo(helo);
                ProcessedEvent::ReplyChangeState(StateSMTP::Helo, SMTPReplyCode::Code250Helo)
            }

            (_, Event::EhloCmd(helo)) => {
                self.set_helo(helo);
                ProcessedEvent::ReplyChangeState(StateSMTP::Helo, SMTPReplyCode::Code250Ehlo)
            }

            (_, Event::Auth(mechanism, initial_response)) => {
                ProcessedEvent::ChangeState(StateSMTP::Authentication(mechanism, initial_response))
            }

            (_, Event::MailCmd(mail_from)) => {
                self.set_mail_from(mail_from);
                ProcessedEvent::ReplyChangeState(StateSMTP::MailFrom, SMTPReplyCode::Code250)
            }

            (_, Event::RcptCmd(rcpt_to)) => {
                log::trace!(target: RECEIVER, "new recipient=\"{}\"", rcpt_to);
                if self.ctx.envelop.rcpt.len() >= self.rcpt_count_max {
                    ProcessedEvent::ReplyChangeState(
                        StateSMTP::RcptTo,
                        SMTPReplyCode::Code452TooManyRecipients,
                    )
                } else {
                    self.ctx.envelop.rcpt.push(rcpt_to);
                    ProcessedEvent::ReplyChangeState(StateSMTP::RcptTo, SMTPReplyCode::Code250)
                }
            }

            (_, Event::DataCmd) => {
                self.ctx.body = String::with_capacity(vsink_common::MAIL_CAPACITY);
                ProcessedEvent::ReplyChangeState(StateSMTP::Data, SMTPReplyCode::Code354)
            }

            (StateSMTP::Data, Event::DataLine(line)) => {
                self.ctx.body.push_str(&line);
                self.ctx.body.push_str("\r\n");
                ProcessedEvent::Nothing
            }

            (StateSMTP::Data, Event::DataEnd) => {
                log::debug!(
                    target: RECEIVER,
                    "data terminator received, body size={}",
                    self.ctx.body.len()
                );

                let mut output =
                    MailContext::new(self.ctx.client_addr, self.ctx.connection_timestamp);
                output.envelop.helo = self.ctx.envelop.helo.clone();
                std::mem::swap(&mut self.ctx, &mut output);

                ProcessedEvent::TransactionCompleted(Box::new(output))
            }

            // a DataLine outside of the DATA state, cannot happen: the
            // parser only emits it in that state.
            _ => ProcessedEvent::Reply(SMTPReplyCode::Code500),
        }
    }
}

impl Transaction {
    fn set_helo(&mut self, helo: String) {
        self.ctx.body.clear();
        self.ctx.metadata = None;
        self.ctx.envelop = Envelop {
            helo,
            mail_from: None,
            rcpt: vec![],
        };
    }

    fn set_mail_from(&mut self, mail_from: Option<vsink_common::Address>) {
        self.ctx.body.clear();
        self.ctx.envelop.rcpt.clear();
        self.ctx.envelop.mail_from = mail_from;
        self.ctx.metadata = Some(MessageMetadata::new(self.ctx.connection_timestamp));

        log::trace!(target: RECEIVER, "envelop=\"{:?}\"", self.ctx.envelop);
    }
}

fn get_timeout_for_state(
    config: &std::sync::Arc<Config>,
    state: &StateSMTP,
) -> std::time::Duration {
    let timeouts = &config.server.smtp.timeout_client;
    match state {
        StateSMTP::Connect => timeouts.connect,
        StateSMTP::Helo => timeouts.helo,
        StateSMTP::MailFrom => timeouts.mail_from,
        StateSMTP::RcptTo => timeouts.rcpt_to,
        StateSMTP::Data => timeouts.data,
        _ => std::time::Duration::from_secs(5 * 60),
    }
}

impl Transaction {
    pub async fn receive<S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin>(
        conn: &mut Connection<S>,
        helo_domain: &Option<String>,
    ) -> anyhow::Result<TransactionResult> {
        let mut transaction = Self {
            state: if helo_domain.is_none() {
                StateSMTP::Connect
            } else {
                StateSMTP::Helo
            },
            ctx: MailContext::new(conn.client_addr, conn.timestamp),
            rcpt_count_max: conn.config.server.smtp.rcpt_count_max,
        };

        if let Some(helo) = helo_domain.as_ref().cloned() {
            transaction.set_helo(helo);
        }

        let mut read_timeout = get_timeout_for_state(&conn.config, &transaction.state);

        loop {
            match &transaction.state {
                StateSMTP::Authentication(mechanism, initial_response) => {
                    return Ok(TransactionResult::Authentication(
                        transaction.ctx.envelop.helo.clone(),
                        *mechanism,
                        initial_response.clone(),
                    ));
                }
                StateSMTP::Stop => {
                    conn.is_alive = false;
                    return Ok(TransactionResult::Nothing);
                }
                _ => {}
            }

            match conn.read(read_timeout).await {
                Ok(Some(client_message)) => {
                    match transaction.parse_and_apply_and_get_reply(&client_message) {
                        ProcessedEvent::Nothing => {}
                        ProcessedEvent::Reply(reply_to_send) => {
                            conn.send_code(reply_to_send).await?;
                        }
                        ProcessedEvent::ChangeState(new_state) => {
                            log::info!(
                                target: RECEIVER,
                                "================ STATE: /{}/ => /{}/",
                                transaction.state,
                                new_state
                            );
                            transaction.state = new_state;
                            read_timeout = get_timeout_for_state(&conn.config, &transaction.state);
                        }
                        ProcessedEvent::ReplyChangeState(new_state, reply_to_send) => {
                            log::info!(
                                target: RECEIVER,
                                "================ STATE: /{}/ => /{}/",
                                transaction.state,
                                new_state
                            );
                            transaction.state = new_state;
                            read_timeout = get_timeout_for_state(&conn.config, &transaction.state);
                            conn.send_code(reply_to_send).await?;
                        }
                        ProcessedEvent::TransactionCompleted(mail) => {
                            return Ok(TransactionResult::Mail(mail));
                        }
                    }
                }
                Ok(None) => {
                    log::info!(target: RECEIVER, "eof");
                    conn.is_alive = false;
                    return Ok(TransactionResult::Nothing);
                }
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                    conn.send_code(SMTPReplyCode::Code451Timeout).await?;
                    anyhow::bail!(e)
                }
                Err(e) => anyhow::bail!(e),
            }
        }
    }
}
