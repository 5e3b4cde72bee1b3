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
use crate::address::Address;
use crate::code::SMTPReplyCode;
use crate::mechanism::Mechanism;

/// Commands sent by clients and understood by this server
/// See "Simple Mail Transfer Protocol"
/// https://datatracker.ietf.org/doc/html/rfc5321
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Event {
    /// Used to identify the SMTP client to the SMTP server.
    /// Syntax = `"HELO" SP ( Domain / address-literal ) CRLF`
    HeloCmd(String),
    /// Used to identify the SMTP client to the SMTP server and request smtp extensions.
    /// Syntax = `"EHLO" SP ( Domain / address-literal ) CRLF`
    EhloCmd(String),
    /// Initiate a mail transaction.
    /// Syntax = `"MAIL FROM:" Reverse-path [SP Mail-parameters] CRLF`
    ///
    /// `None` is the null reverse-path `<>`.
    MailCmd(Option<Address>),
    /// Identify an individual recipient of the mail data.
    /// Syntax = `"RCPT TO:" Forward-path [SP Rcpt-parameters] CRLF`
    RcptCmd(Address),
    /// This command causes the mail data to be appended to the mail data
    /// buffer.
    /// Syntax = `"DATA" CRLF`
    DataCmd,
    /// Lines ended by CRLF sent between [`Event::DataCmd`] and [`Event::DataEnd`],
    /// leading transparency dot already removed
    DataLine(String),
    /// The mail data are terminated by a line containing only a period.
    /// Syntax = `"." CRLF`
    DataEnd,
    /// Abort the current mail transaction. Any stored sender, recipients,
    /// and mail data MUST be discarded.
    /// Syntax = `"RSET" CRLF`
    RsetCmd,
    /// This command does not affect any parameters or previously entered
    /// commands.
    /// Syntax = `"NOOP" [ SP String ] CRLF`
    NoopCmd,
    /// The receiver MUST send a "221" reply and close the transmission
    /// channel.
    /// Syntax = `"QUIT" CRLF`
    QuitCmd,
    /// Authentication with SASL protocol
    /// https://datatracker.ietf.org/doc/html/rfc4954
    /// Syntax = `"AUTH" mechanism [initial-response] CRLF`
    Auth(Mechanism, Option<String>),
}

impl Event {
    /// Create a valid SMTP command (or event) from a string OR return a SMTP error code
    /// See https://datatracker.ietf.org/doc/html/rfc5321#section-4.1
    ///
    /// # Errors
    ///
    /// * the reply code to send back for an unrecognized or ill-formed line
    pub fn parse_cmd(input: &str) -> Result<Self, SMTPReplyCode> {
        if input.len() > 998 || input.is_empty() {
            return Err(SMTPReplyCode::Code500);
        }

        let words = input.split_whitespace().collect::<Vec<&str>>();

        let mut smtp_args = words.iter();
        let smtp_verb = match smtp_args.next() {
            // NOTE: if the first word is not the beginning of the input (whitespace before)
            Some(first_word) if &input[..first_word.len()] != *first_word => {
                return Err(SMTPReplyCode::Code501);
            }
            Some(smtp_verb) => smtp_verb,
            None => return Err(SMTPReplyCode::Code500),
        };

        match (
            smtp_verb.to_ascii_uppercase().as_str(),
            smtp_args.as_slice(),
        ) {
            ("HELO", [domain]) => Ok(Self::HeloCmd((*domain).to_string())),
            ("EHLO", [domain]) => Ok(Self::EhloCmd((*domain).to_string())),
            ("MAIL", args) => Self::parse_arg_mail_from(args),
            ("RCPT", args) => Self::parse_arg_rcpt_to(args),

            ("DATA", []) => Ok(Self::DataCmd),
            ("QUIT", []) => Ok(Self::QuitCmd),
            ("RSET", []) => Ok(Self::RsetCmd),
            ("NOOP", [..]) => Ok(Self::NoopCmd),

            ("AUTH", [mechanism]) => Self::parse_arg_auth(mechanism, None),
            ("AUTH", [mechanism, initial_response]) => {
                Self::parse_arg_auth(mechanism, Some(initial_response))
            }

            ("HELO" | "EHLO" | "DATA" | "QUIT" | "RSET" | "AUTH", _) => {
                Err(SMTPReplyCode::Code501)
            }
            _ => Err(SMTPReplyCode::Code500),
        }
    }

    /// Extract the mailbox out of a (possibly bracketed) path argument.
    ///
    /// The case of the address is preserved.
    fn from_path(input: &str, may_be_empty: bool) -> Result<Option<Address>, SMTPReplyCode> {
        let mailbox = input
            .trim()
            .trim_start_matches('<')
            .trim_end_matches('>');

        if mailbox.is_empty() {
            return if may_be_empty {
                Ok(None)
            } else {
                Err(SMTPReplyCode::Code501)
            };
        }

        match Address::try_from(mailbox.to_string()) {
            Ok(mailbox) => Ok(Some(mailbox)),
            Err(_) => Err(SMTPReplyCode::Code501),
        }
    }

    fn parse_arg_mail_from(args: &[&str]) -> Result<Self, SMTPReplyCode> {
        // ESMTP parameters after the path (BODY=, SMTPUTF8, ...) are accepted
        // and ignored, this server never relays.
        match args {
            [from, reverse_path, ..] if from.eq_ignore_ascii_case("FROM:") => {
                Ok(Self::MailCmd(Self::from_path(reverse_path, true)?))
            }
            [from_and_reverse_path, ..]
                if from_and_reverse_path.len() > "FROM:".len()
                    && from_and_reverse_path[.."FROM:".len()].eq_ignore_ascii_case("FROM:") =>
            {
                Ok(Self::MailCmd(Self::from_path(
                    &from_and_reverse_path["FROM:".len()..],
                    true,
                )?))
            }
            _ => Err(SMTPReplyCode::Code501),
        }
    }

    fn parse_arg_rcpt_to(args: &[&str]) -> Result<Self, SMTPReplyCode> {
        match args {
            [to, forward_path, ..] if to.eq_ignore_ascii_case("TO:") => {
                match Self::from_path(forward_path, false)? {
                    Some(forward_path) => Ok(Self::RcptCmd(forward_path)),
                    None => Err(SMTPReplyCode::Code501),
                }
            }
            [to_and_forward_path, ..]
                if to_and_forward_path.len() > "TO:".len()
                    && to_and_forward_path[.."TO:".len()].eq_ignore_ascii_case("TO:") =>
            {
                match Self::from_path(&to_and_forward_path["TO:".len()..], false)? {
                    Some(forward_path) => Ok(Self::RcptCmd(forward_path)),
                    None => Err(SMTPReplyCode::Code501),
                }
            }
            _ => Err(SMTPReplyCode::Code501),
        }
    }

    fn parse_arg_auth(
        mechanism: &str,
        initial_response: Option<&str>,
    ) -> Result<Self, SMTPReplyCode> {
        Ok(Self::Auth(
            <Mechanism as std::str::FromStr>::from_str(mechanism)
                .map_err(|_| SMTPReplyCode::Code504)?,
            initial_response.map(str::to_string),
        ))
    }

    /// Parse a smtp input received between DATA and <CRLF>.<CRLF> (DATA END)
    /// and handle dot-stuffing
    ///
    /// # Errors
    ///
    /// * input length is too long (> 998)
    pub fn parse_data(input: &str) -> Result<Self, SMTPReplyCode> {
        match input {
            "." => Ok(Self::DataEnd),
            too_long if too_long.len() > 998 => Err(SMTPReplyCode::Code500),
            dot_string if dot_string.starts_with('.') => {
                // https://www.rfc-editor.org/rfc/rfc5321#section-4.5.2
                Ok(Self::DataLine(dot_string[1..].to_string()))
            }
            _ => Ok(Self::DataLine(input.to_string())),
        }
    }
}
