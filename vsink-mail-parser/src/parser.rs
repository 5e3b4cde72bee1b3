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
use crate::encoding::{decode_bytes, decode_text, TransferEncoding};
use crate::helpers::{get_header, read_header_block, serialize_headers, Header};
use crate::mime_type::{find_mime_header, mime_headers, MimeHeader};

/// a boundary serves as a delimiter between mime parts in a multipart section.
enum BoundaryType {
    Delimiter,
    End,
    OutOfScope,
}

/// A file carried by a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAttachment {
    /// resolved filename, never empty.
    pub filename: String,
    /// media type of the part, `application/octet-stream` when unknown.
    pub content_type: String,
    /// decoded content, never empty.
    pub data: Vec<u8>,
}

/// The neutral result of parsing one DATA blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMail {
    /// Subject header, verbatim.
    pub subject: String,
    /// Cc header, verbatim.
    pub cc: String,
    /// Bcc header, verbatim.
    pub bcc: String,
    /// reassembled canonical `Name: value\r\n` block.
    pub headers: String,
    /// decoded text/plain body, trimmed. may be empty.
    pub text_body: String,
    /// decoded text/html body, trimmed. may be empty.
    pub html_body: String,
    /// attachments in order of appearance.
    pub attachments: Vec<ParsedAttachment>,
}

/// Instance parsing a message body.
///
/// Parsing never fails: on any structural error the remaining input
/// degrades to a text/plain body.
#[derive(Default)]
pub struct MailMimeParser {
    boundary_stack: Vec<String>,
}

impl MailMimeParser {
    /// parse method
    pub fn parse(&mut self, data: &[u8]) -> ParsedMail {
        let input = String::from_utf8_lossy(data).into_owned();
        let lines = input.lines().collect::<Vec<_>>();
        let mut content = &lines[..];

        let headers = read_header_block(&mut content);

        let mut parsed = ParsedMail {
            subject: header_value(&headers, "subject"),
            cc: header_value(&headers, "cc"),
            bcc: header_value(&headers, "bcc"),
            headers: serialize_headers(&headers),
            ..ParsedMail::default()
        };

        let mime = mime_headers(&headers);
        let encoding = transfer_encoding(&mime);

        match find_mime_header(&mime, "content-type") {
            Some(content_type) if content_type.value.starts_with("multipart/") => {
                match content_type.param("boundary") {
                    Some(boundary) => self.parse_multipart(&boundary, &mut content, &mut parsed),
                    None => {
                        log::debug!("multipart without boundary parameter, body kept as text");
                        parsed.text_body = decode_text(content, encoding);
                    }
                }
            }
            Some(content_type) if content_type.value == "text/html" => {
                parsed.html_body = decode_text(content, encoding);
            }
            _ => {
                // no content-type, an unparseable one, or any other media
                // type: the body is kept as plain text.
                parsed.text_body = decode_text(content, encoding);
            }
        }

        parsed.text_body = parsed.text_body.trim().to_string();
        parsed.html_body = parsed.html_body.trim().to_string();
        parsed
    }

    /// walk one multipart section, `boundary` as given in the header
    /// parameter (a leading `--` is tolerated and ignored).
    fn parse_multipart(&mut self, boundary: &str, content: &mut &[&str], parsed: &mut ParsedMail) {
        self.boundary_stack
            .push(boundary.trim_start_matches('-').to_string());

        // preamble, up to the first delimiter.
        loop {
            if content.is_empty() {
                log::debug!("EOF reached while looking for boundary '{}'", boundary);
                self.boundary_stack.pop();
                return;
            }
            match self.check_boundary(content[0]) {
                Some(BoundaryType::Delimiter) => {
                    *content = &content[1..];
                    break;
                }
                Some(BoundaryType::End) => {
                    *content = &content[1..];
                    self.boundary_stack.pop();
                    return;
                }
                Some(BoundaryType::OutOfScope) => {
                    // a parent boundary before ours: give up on this part,
                    // the caller handles the line.
                    self.boundary_stack.pop();
                    return;
                }
                None => *content = &content[1..],
            }
        }

        // one iteration per part.
        loop {
            self.parse_part(content, parsed);

            if content.is_empty() {
                self.boundary_stack.pop();
                return;
            }
            match self.check_boundary(content[0]) {
                Some(BoundaryType::Delimiter) => *content = &content[1..],
                Some(BoundaryType::End) => {
                    // the epilogue after the closing marker is discarded.
                    *content = &content[1..];
                    self.boundary_stack.pop();
                    self.skip_epilogue(content);
                    return;
                }
                Some(BoundaryType::OutOfScope) | None => {
                    self.boundary_stack.pop();
                    return;
                }
            }
        }
    }

    fn skip_epilogue(&self, content: &mut &[&str]) {
        while !content.is_empty() && self.check_boundary(content[0]).is_none() {
            *content = &content[1..];
        }
    }

    /// parse one part of a multipart: headers, then either a nested
    /// multipart or a leaf body ending on the next boundary.
    fn parse_part(&mut self, content: &mut &[&str], parsed: &mut ParsedMail) {
        let headers = mime_headers(&read_header_block(content));

        let content_type = find_mime_header(&headers, "content-type");
        let disposition = find_mime_header(&headers, "content-disposition");

        // nested multipart, unless the part is explicitly an attachment.
        if let Some(content_type) = content_type {
            if content_type.value.starts_with("multipart/") && disposition.is_none() {
                if let Some(boundary) = content_type.param("boundary") {
                    self.parse_multipart(&boundary, content, parsed);
                    return;
                }
            }
        }

        let mut body = Vec::new();
        while !content.is_empty() && self.check_boundary(content[0]).is_none() {
            body.push(content[0]);
            *content = &content[1..];
        }

        self.process_leaf(&headers, &body, parsed);
    }

    /// classification and decoding of a non-multipart part.
    fn process_leaf(&self, headers: &[MimeHeader], body: &[&str], parsed: &mut ParsedMail) {
        let encoding = transfer_encoding(headers);
        let content_type = find_mime_header(headers, "content-type");

        match find_mime_header(headers, "content-disposition") {
            Some(disposition) if disposition.value == "attachment" => {
                self.store_attachment(disposition, content_type, body, encoding, parsed);
            }
            Some(disposition) => {
                // inline images and other explicit dispositions are not
                // persisted, the mailbox view only keeps real attachments.
                log::debug!("skipping part with disposition '{}'", disposition.value);
            }
            None => {
                // parts without a content-type default to text/plain.
                let media = content_type.map_or("text/plain", |h| h.value.as_str());
                match media {
                    "text/plain" => replace_if_longer(&mut parsed.text_body, &decode_text(body, encoding)),
                    "text/html" => replace_if_longer(&mut parsed.html_body, &decode_text(body, encoding)),
                    other => log::debug!("ignoring content of media type '{}'", other),
                }
            }
        }
    }

    fn store_attachment(
        &self,
        disposition: &MimeHeader,
        content_type: Option<&MimeHeader>,
        body: &[&str],
        encoding: TransferEncoding,
        parsed: &mut ParsedMail,
    ) {
        // filename priority: rfc2231 continuations, then the plain
        // `filename=` parameter, then `name=` on Content-Type.
        let filename = disposition
            .param("filename")
            .or_else(|| content_type.and_then(|h| h.param("name")))
            .unwrap_or_default();

        if filename.is_empty() {
            log::debug!("attachment without filename dropped");
            return;
        }

        let data = match decode_bytes(body, encoding) {
            Some(data) if !data.is_empty() => data,
            _ => {
                log::debug!("attachment '{}' with empty or undecodable body dropped", filename);
                return;
            }
        };

        parsed.attachments.push(ParsedAttachment {
            filename,
            content_type: content_type
                .map(|h| h.value.clone())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            data,
        });
    }

    /// match a line against the boundary stack.
    fn check_boundary(&self, line: &str) -> Option<BoundaryType> {
        match self.boundary_stack.last() {
            Some(boundary) => match get_boundary_type(line, boundary) {
                None => {
                    // check the rest of the stack in case of a badly
                    // terminated inner multipart.
                    if self.boundary_stack[..self.boundary_stack.len() - 1]
                        .iter()
                        .any(|b| get_boundary_type(line, b).is_some())
                    {
                        Some(BoundaryType::OutOfScope)
                    } else {
                        None
                    }
                }
                Some(t) => Some(t),
            },
            _ => None,
        }
    }
}

fn header_value(headers: &[Header], name: &str) -> String {
    get_header(headers, name).map(|h| h.value.clone()).unwrap_or_default()
}

fn transfer_encoding(headers: &[MimeHeader]) -> TransferEncoding {
    TransferEncoding::of(
        find_mime_header(headers, "content-transfer-encoding").map(|h| h.value.as_str()),
    )
}

/// keep the longer of the two trimmed candidates, a deterministic rule for
/// the alternatives of a multipart/alternative section.
fn replace_if_longer(current: &mut String, candidate: &str) {
    let candidate = candidate.trim();
    if !candidate.is_empty() && candidate.len() > current.trim().len() {
        *current = candidate.to_string();
    }
}

/// deduce the boundary type of a line.
///
/// tolerated variants seen from real clients: `--b` and `----b` markers for
/// a boundary parameter `b`, and a parameter already carrying the `--`
/// prefix. the closing marker additionally ends with `--`.
#[inline]
fn get_boundary_type(line: &str, boundary: &str) -> Option<BoundaryType> {
    if !line.starts_with("--") || boundary.is_empty() {
        return None;
    }

    let marker = line.trim_start_matches('-').trim_end();
    if marker == boundary {
        Some(BoundaryType::Delimiter)
    } else if marker
        .strip_suffix("--")
        .map_or(false, |inner| inner == boundary)
    {
        Some(BoundaryType::End)
    } else {
        None
    }
}
