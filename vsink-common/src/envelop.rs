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

/// Data receive during a smtp transaction, distinct from the message headers
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Envelop {
    /// result of the HELO/EHLO command.
    pub helo: String,
    /// the sender of the email, `None` until MAIL FROM is received
    /// (a null reverse-path `<>` also stays `None`).
    pub mail_from: Option<Address>,
    /// the recipients of the email, in order of reception.
    pub rcpt: Vec<Address>,
}

impl Envelop {
    /// a message can only be accepted with a sender and at least one recipient.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.mail_from.is_some() && !self.rcpt.is_empty()
    }
}
