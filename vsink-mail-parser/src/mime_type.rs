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
use crate::encoding::percent_decode;
use crate::helpers::Header;

/// A `Content-*` header split into its main value and its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct MimeHeader {
    pub name: String,
    /// main value, lowercased (`text/plain`, `attachment`, `base64`, ...).
    pub value: String,
    /// parameter ordering does not matter.
    pub args: std::collections::HashMap<String, String>,
}

/// take the name and value of a header and parse those into a [`MimeHeader`].
pub(crate) fn get_mime_header(name: &str, value: &str) -> MimeHeader {
    // cut the current line using the ";" separator into a vector of "arg=value" strings.
    let args = value.split(';').collect::<Vec<&str>>();
    let mut args_iter = args.iter();

    MimeHeader {
        name: name.to_ascii_lowercase(),
        value: args_iter.next().unwrap_or(&"").trim().to_lowercase(),

        // split every element of args by the "=" token (if there are any parameters).
        // inserts all resulting key / value pair into new_args.
        args: args_iter
            .filter_map(|arg| {
                let mut split = arg.splitn(2, '=');
                match (split.next(), split.next()) {
                    (Some(key), Some(value)) => Some((key, value)),
                    // no error here, bad arguments are just omitted.
                    _ => None,
                }
            })
            .map(|(key, value)| {
                (
                    key.trim().to_lowercase(),
                    match (value.find('"'), value.rfind('"')) {
                        (Some(first), Some(last)) if first < last => &value[first + 1..last],
                        _ => value.trim(),
                    }
                    .replace(&['\"', '\\'][..], ""),
                )
            })
            .collect::<std::collections::HashMap<String, String>>(),
    }
}

impl MimeHeader {
    /// the media type and subtype of a `Content-Type` header value.
    pub(crate) fn mime_type(&self) -> Option<(&str, &str)> {
        let mut value = self.value.splitn(2, '/');
        match (value.next(), value.next()) {
            (Some(t), Some(subtype)) if !t.is_empty() => Some((t, subtype)),
            _ => None,
        }
    }

    /// a parameter value, continuation-aware.
    ///
    /// RFC 2231 split parameters (`name*0*=`, `name*1*=`, ...) win over the
    /// plain form; the numbered sections are combined in numeric order,
    /// values of the extended (`*`-terminated) form are percent-decoded and
    /// section 0 loses its leading `charset'language'` tag.
    pub(crate) fn param(&self, name: &str) -> Option<String> {
        if let Some(combined) = self.continuation_param(name) {
            return Some(combined);
        }
        self.args.get(name).cloned()
    }

    fn continuation_param(&self, name: &str) -> Option<String> {
        // single-section extended form: name*=utf-8''value
        if let Some(value) = self.args.get(&format!("{}*", name)) {
            return Some(decode_extended_value(value, true));
        }

        let mut sections = self
            .args
            .iter()
            .filter_map(|(key, value)| {
                let rest = key.strip_prefix(name)?.strip_prefix('*')?;
                let (number, extended) = match rest.strip_suffix('*') {
                    Some(number) => (number, true),
                    None => (rest, false),
                };
                number
                    .parse::<usize>()
                    .ok()
                    .map(|number| (number, extended, value))
            })
            .collect::<Vec<_>>();

        if sections.is_empty() {
            return None;
        }
        sections.sort_by_key(|(number, ..)| *number);

        Some(
            sections
                .into_iter()
                .map(|(number, extended, value)| {
                    if extended {
                        decode_extended_value(value, number == 0)
                    } else {
                        value.clone()
                    }
                })
                .collect::<String>(),
        )
    }
}

/// percent-decode an RFC 2231 extended value, stripping the
/// `charset'language'` prefix on the first section.
fn decode_extended_value(value: &str, first_section: bool) -> String {
    let value = if first_section && value.matches('\'').count() >= 2 {
        let mut quotes = value.match_indices('\'');
        quotes.next();
        let second = quotes.next().map(|(at, _)| at).unwrap_or_default();
        &value[second + 1..]
    } else {
        value
    };

    String::from_utf8_lossy(&percent_decode(value)).into_owned()
}

/// check rfc2045 p.9. Additional MIME Header Fields.
#[inline]
pub(crate) fn is_mime_header(name: &str) -> bool {
    name.to_ascii_lowercase().starts_with("content-")
}

/// the `Content-*` headers of a section, parsed.
pub(crate) fn mime_headers(headers: &[Header]) -> Vec<MimeHeader> {
    headers
        .iter()
        .filter(|h| is_mime_header(&h.name))
        .map(|h| get_mime_header(&h.name, &h.value))
        .collect()
}

pub(crate) fn find_mime_header<'a>(headers: &'a [MimeHeader], name: &str) -> Option<&'a MimeHeader> {
    headers.iter().find(|h| h.name == name)
}
