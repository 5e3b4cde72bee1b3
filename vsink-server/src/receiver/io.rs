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

/// Line-oriented abstraction of the client stream.
///
/// The SMTP dialog and the DATA phase share the socket with no framing
/// beyond CRLF terminators, one buffered reader serves both.
pub struct AbstractIO<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin,
{
    /// inner stream, writes go through it directly.
    pub inner: S,
    buffer: Vec<u8>,
}

impl<S> AbstractIO<S>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Send + Unpin,
{
    ///
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Read the next CRLF (or bare LF) terminated line, without its
    /// terminator. `Ok(None)` is a clean EOF.
    ///
    /// # Errors
    ///
    /// * `std::io::ErrorKind::TimedOut` when the client stalled
    /// * any error of the underlying stream
    pub async fn next_line(
        &mut self,
        timeout: Option<std::time::Duration>,
    ) -> std::io::Result<Option<String>> {
        match timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.next_line_inner())
                .await
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::TimedOut, e))?,
            None => self.next_line_inner().await,
        }
    }

    async fn next_line_inner(&mut self) -> std::io::Result<Option<String>> {
        loop {
            if let Some(position) = self.buffer.iter().position(|b| *b == b'\n') {
                let mut line = self.buffer.drain(..=position).collect::<Vec<u8>>();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(String::from_utf8_lossy(&line).into_owned()));
            }

            let mut chunk = [0_u8; 1024];
            let read = tokio::io::AsyncReadExt::read(&mut self.inner, &mut chunk).await?;
            if read == 0 {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                // the stream ended without a final newline.
                let rest = std::mem::take(&mut self.buffer);
                return Ok(Some(String::from_utf8_lossy(&rest).into_owned()));
            }
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }
}
