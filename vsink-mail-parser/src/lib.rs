//! vSink mail parser
//!
//! Decodes a raw RFC 5322 message (the DATA blob of one SMTP transaction)
//! into a neutral [`ParsedMail`]: canonical headers, the text and html
//! bodies, and the attachments with their decoded content.
//!
//! Parsing never fails: structurally broken input degrades to "the whole
//! body is text/plain" and the SMTP layer decides acceptance.

#![doc(html_no_source)]
#![deny(missing_docs)]
//
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
//
#![allow(clippy::doc_markdown)]

mod encoding;
mod helpers;
mod mime_type;
mod parser;

pub use parser::{MailMimeParser, ParsedAttachment, ParsedMail};
