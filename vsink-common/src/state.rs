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
use crate::mechanism::Mechanism;

/// State of one SMTP session
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum StateSMTP {
    /// After TCP/IP socket has been accepted
    Connect,
    /// After receiving HELO/EHLO command
    Helo,
    /// After receiving MAIL FROM command
    MailFrom,
    /// After receiving RCPT TO command
    RcptTo,
    /// After receiving DATA command, every line is part of the message body
    Data,
    /// An AUTH command started a challenge exchange
    Authentication(Mechanism, Option<String>),
    /// After receiving QUIT command or EOF
    Stop,
}

impl std::fmt::Display for StateSMTP {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            StateSMTP::Connect => "connect",
            StateSMTP::Helo => "helo",
            StateSMTP::MailFrom => "mail",
            StateSMTP::RcptTo => "rcpt",
            StateSMTP::Data => "data",
            StateSMTP::Authentication(..) => "authentication",
            StateSMTP::Stop => "stop",
        })
    }
}
