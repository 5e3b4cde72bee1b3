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

/// One unfolded RFC 5322 header field. The original name casing is kept for
/// the canonical reserialization, lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub(crate) fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[inline]
pub(crate) fn has_wsc(input: &str) -> bool {
    input.starts_with(|c| c == ' ' || c == '\t')
}

/// read the current line or folded content and extract a header if there is any.
///
/// the cursor is advanced over the continuation lines, but not over the
/// first line itself.
pub(crate) fn read_header(content: &mut &[&str]) -> Option<Header> {
    let mut split = content[0].splitn(2, ':');

    match (split.next(), split.next()) {
        (Some(name), Some(field)) if !name.is_empty() && !has_wsc(name) => Some(Header {
            name: name.trim().to_string(),
            value: format!(
                "{}{}",
                field.trim(),
                content[1..]
                    .iter()
                    .take_while(|s| has_wsc(s))
                    .map(|s| {
                        *content = &content[1..];
                        format!(" {}", s.trim())
                    })
                    .collect::<Vec<String>>()
                    .concat()
            ),
        }),
        _ => None,
    }
}

/// read a full header section, consuming the blank separator line when
/// there is one. stops without consuming on a line that cannot be a header
/// (a misplaced boundary marker for instance).
pub(crate) fn read_header_block(content: &mut &[&str]) -> Vec<Header> {
    let mut headers = Vec::with_capacity(10);

    while !content.is_empty() {
        if content[0].trim().is_empty() {
            *content = &content[1..];
            break;
        }
        match read_header(content) {
            Some(header) => headers.push(header),
            None => break,
        }
        *content = &content[1..];
    }

    headers
}

/// find a header by name, case-insensitive.
pub(crate) fn get_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a Header> {
    headers.iter().find(|h| h.is(name))
}

/// reassemble the canonical `Name: value\r\n` block.
pub(crate) fn serialize_headers(headers: &[Header]) -> String {
    headers
        .iter()
        .map(|h| format!("{}: {}\r\n", h.name, h.value))
        .collect::<String>()
}
