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

/// Content-Transfer-Encoding of a mime section.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum TransferEncoding {
    Base64,
    QuotedPrintable,
    /// 7bit, 8bit, binary or anything unknown: passed through.
    Identity,
}

impl TransferEncoding {
    pub(crate) fn of(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("base64") => Self::Base64,
            Some("quoted-printable") => Self::QuotedPrintable,
            _ => Self::Identity,
        }
    }
}

/// decode the body lines of a section to raw bytes.
///
/// returns `None` when a base64 body cannot be decoded, the caller drops
/// the section.
pub(crate) fn decode_bytes(lines: &[&str], encoding: TransferEncoding) -> Option<Vec<u8>> {
    match encoding {
        TransferEncoding::Base64 => {
            let compact = lines
                .concat()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect::<String>();
            base64::decode(compact).ok()
        }
        TransferEncoding::QuotedPrintable => Some(decode_quoted_printable(lines)),
        TransferEncoding::Identity => Some(lines.join("\n").into_bytes()),
    }
}

/// decode the body lines of a section to text, lossy on invalid utf8.
pub(crate) fn decode_text(lines: &[&str], encoding: TransferEncoding) -> String {
    decode_bytes(lines, encoding)
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_else(|| lines.join("\n"))
}

/// quoted-printable body decoding, RFC 2045 §6.7.
///
/// `=XX` is a literal byte, a trailing `=` is a soft line break. Invalid
/// escapes are kept verbatim.
fn decode_quoted_printable(lines: &[&str]) -> Vec<u8> {
    let mut output = Vec::with_capacity(lines.iter().map(|l| l.len() + 1).sum());

    for (index, line) in lines.iter().enumerate() {
        let bytes = line.as_bytes();
        let mut soft_break = false;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                // '=' as the last byte of the line is a soft break
                b'=' if i + 1 == bytes.len() => {
                    soft_break = true;
                    i += 1;
                }
                b'=' => match (
                    bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16)),
                    bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16)),
                ) {
                    (Some(hi), Some(lo)) => {
                        output.push((hi * 16 + lo) as u8);
                        i += 3;
                    }
                    _ => {
                        output.push(b'=');
                        i += 1;
                    }
                },
                byte => {
                    output.push(byte);
                    i += 1;
                }
            }
        }

        if !soft_break && index + 1 < lines.len() {
            output.extend_from_slice(b"\r\n");
        }
    }

    output
}

/// percent-decoding as used by RFC 2231 extended parameter values.
///
/// invalid escapes are kept verbatim.
pub(crate) fn percent_decode(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' => match (
                bytes.get(i + 1).and_then(|b| (*b as char).to_digit(16)),
                bytes.get(i + 2).and_then(|b| (*b as char).to_digit(16)),
            ) {
                (Some(hi), Some(lo)) => {
                    output.push((hi * 16 + lo) as u8);
                    i += 3;
                }
                _ => {
                    output.push(b'%');
                    i += 1;
                }
            },
            byte => {
                output.push(byte);
                i += 1;
            }
        }
    }

    output
}
