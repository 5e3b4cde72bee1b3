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

/// 2yz  Positive Completion reply
/// 3yz  Positive Intermediate reply
/// 4yz  Transient Negative Completion reply
/// 5yz  Permanent Negative Completion reply
///
/// The text sent for each code lives in the configuration
/// (`server.smtp.codes`), this enum is only the key.
#[derive(
    Debug,
    Ord,
    PartialOrd,
    Eq,
    PartialEq,
    Hash,
    Copy,
    Clone,
    enum_iterator::IntoEnumIterator,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(untagged)]
#[serde(into = "String")]
#[serde(try_from = "String")]
pub enum SMTPReplyCode {
    /// service ready, sent when the connection is accepted
    Greetings,
    /// service closing transmission channel
    Code221,
    /// authentication succeeded
    Code235,
    /// requested mail action okay, completed
    Code250,
    /// HELO acknowledgement
    Code250Helo,
    /// EHLO acknowledgement, multi-line with the advertised extensions
    Code250Ehlo,
    /// the message has been accepted and stored
    Code250Queued,
    /// empty server challenge (AUTH PLAIN without initial response)
    Code334,
    /// start mail input
    Code354,
    /// the client took too long to send data
    Code451Timeout,
    /// the client made too many protocol errors
    Code451TooManyError,
    /// requested action not taken: too many recipients
    Code452TooManyRecipients,
    /// syntax error, command unrecognized
    Code500,
    /// syntax error in parameters or arguments
    Code501,
    /// the client canceled an AUTH exchange with "*"
    Code501AuthCanceled,
    /// authentication mechanism not supported
    Code504,
    /// authentication credentials invalid
    Code535,
    /// DATA terminated without a usable envelope
    Code550EnvelopeIncomplete,
    /// no recipient maps to a mailbox and no root account is configured
    Code550NoMailbox,
    /// neither a text/plain nor a text/html body was found
    Code550EmptyBody,
    /// an attachment is missing its filename
    Code550AttachmentFilename,
    /// an attachment has an empty body
    Code550AttachmentContent,
    /// the storage adapter refused the message
    Code550StoreFailed,
    /// too many concurrent connections
    Code554ConnectionMaxReached,
}

impl SMTPReplyCode {
    /// Is the code an error, driving the per-connection error counter.
    #[must_use]
    pub const fn is_error(self) -> bool {
        match self {
            SMTPReplyCode::Greetings
            | SMTPReplyCode::Code221
            | SMTPReplyCode::Code235
            | SMTPReplyCode::Code250
            | SMTPReplyCode::Code250Helo
            | SMTPReplyCode::Code250Ehlo
            | SMTPReplyCode::Code250Queued
            | SMTPReplyCode::Code334
            | SMTPReplyCode::Code354 => false,
            //
            SMTPReplyCode::Code451Timeout
            | SMTPReplyCode::Code451TooManyError
            | SMTPReplyCode::Code452TooManyRecipients
            | SMTPReplyCode::Code500
            | SMTPReplyCode::Code501
            | SMTPReplyCode::Code501AuthCanceled
            | SMTPReplyCode::Code504
            | SMTPReplyCode::Code535
            | SMTPReplyCode::Code550EnvelopeIncomplete
            | SMTPReplyCode::Code550NoMailbox
            | SMTPReplyCode::Code550EmptyBody
            | SMTPReplyCode::Code550AttachmentFilename
            | SMTPReplyCode::Code550AttachmentContent
            | SMTPReplyCode::Code550StoreFailed
            | SMTPReplyCode::Code554ConnectionMaxReached => true,
        }
    }
}

impl std::fmt::Display for SMTPReplyCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SMTPReplyCode::Greetings => "Greetings",
            SMTPReplyCode::Code221 => "Code221",
            SMTPReplyCode::Code235 => "Code235",
            SMTPReplyCode::Code250 => "Code250",
            SMTPReplyCode::Code250Helo => "Code250Helo",
            SMTPReplyCode::Code250Ehlo => "Code250Ehlo",
            SMTPReplyCode::Code250Queued => "Code250Queued",
            SMTPReplyCode::Code334 => "Code334",
            SMTPReplyCode::Code354 => "Code354",
            SMTPReplyCode::Code451Timeout => "Code451Timeout",
            SMTPReplyCode::Code451TooManyError => "Code451TooManyError",
            SMTPReplyCode::Code452TooManyRecipients => "Code452TooManyRecipients",
            SMTPReplyCode::Code500 => "Code500",
            SMTPReplyCode::Code501 => "Code501",
            SMTPReplyCode::Code501AuthCanceled => "Code501AuthCanceled",
            SMTPReplyCode::Code504 => "Code504",
            SMTPReplyCode::Code535 => "Code535",
            SMTPReplyCode::Code550EnvelopeIncomplete => "Code550EnvelopeIncomplete",
            SMTPReplyCode::Code550NoMailbox => "Code550NoMailbox",
            SMTPReplyCode::Code550EmptyBody => "Code550EmptyBody",
            SMTPReplyCode::Code550AttachmentFilename => "Code550AttachmentFilename",
            SMTPReplyCode::Code550AttachmentContent => "Code550AttachmentContent",
            SMTPReplyCode::Code550StoreFailed => "Code550StoreFailed",
            SMTPReplyCode::Code554ConnectionMaxReached => "Code554ConnectionMaxReached",
        })
    }
}

impl From<SMTPReplyCode> for String {
    fn from(code: SMTPReplyCode) -> Self {
        format!("{}", code)
    }
}

///
#[derive(Debug, PartialEq, Eq)]
pub struct SMTPReplyCodeFromStrError;

impl std::fmt::Display for SMTPReplyCodeFromStrError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("SMTPReplyCodeFromStrError")
    }
}

impl std::str::FromStr for SMTPReplyCode {
    type Err = SMTPReplyCodeFromStrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Greetings" => Ok(SMTPReplyCode::Greetings),
            "Code221" => Ok(SMTPReplyCode::Code221),
            "Code235" => Ok(SMTPReplyCode::Code235),
            "Code250" => Ok(SMTPReplyCode::Code250),
            "Code250Helo" => Ok(SMTPReplyCode::Code250Helo),
            "Code250Ehlo" => Ok(SMTPReplyCode::Code250Ehlo),
            "Code250Queued" => Ok(SMTPReplyCode::Code250Queued),
            "Code334" => Ok(SMTPReplyCode::Code334),
            "Code354" => Ok(SMTPReplyCode::Code354),
            "Code451Timeout" => Ok(SMTPReplyCode::Code451Timeout),
            "Code451TooManyError" => Ok(SMTPReplyCode::Code451TooManyError),
            "Code452TooManyRecipients" => Ok(SMTPReplyCode::Code452TooManyRecipients),
            "Code500" => Ok(SMTPReplyCode::Code500),
            "Code501" => Ok(SMTPReplyCode::Code501),
            "Code501AuthCanceled" => Ok(SMTPReplyCode::Code501AuthCanceled),
            "Code504" => Ok(SMTPReplyCode::Code504),
            "Code535" => Ok(SMTPReplyCode::Code535),
            "Code550EnvelopeIncomplete" => Ok(SMTPReplyCode::Code550EnvelopeIncomplete),
            "Code550NoMailbox" => Ok(SMTPReplyCode::Code550NoMailbox),
            "Code550EmptyBody" => Ok(SMTPReplyCode::Code550EmptyBody),
            "Code550AttachmentFilename" => Ok(SMTPReplyCode::Code550AttachmentFilename),
            "Code550AttachmentContent" => Ok(SMTPReplyCode::Code550AttachmentContent),
            "Code550StoreFailed" => Ok(SMTPReplyCode::Code550StoreFailed),
            "Code554ConnectionMaxReached" => Ok(SMTPReplyCode::Code554ConnectionMaxReached),
            _ => Err(SMTPReplyCodeFromStrError),
        }
    }
}

impl TryFrom<String> for SMTPReplyCode {
    type Error = SMTPReplyCodeFromStrError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        <SMTPReplyCode as std::str::FromStr>::from_str(&value)
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::SMTPReplyCode;

    #[test]
    fn error() {
        assert_eq!(
            format!("{}", SMTPReplyCode::from_str("foo").unwrap_err()),
            "SMTPReplyCodeFromStrError"
        );
    }

    #[test]
    fn same() {
        for s in <SMTPReplyCode as enum_iterator::IntoEnumIterator>::into_enum_iter() {
            assert_eq!(SMTPReplyCode::from_str(&format!("{}", s)).unwrap(), s);
        }
    }
}
