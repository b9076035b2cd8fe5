/*
 * handler.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * This file is part of Couchwire, a CouchDB HTTP transport library.
 *
 * Couchwire is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Couchwire is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Couchwire.  If not, see <http://www.gnu.org/licenses/>.
 */

//! Callback traits driven by the adapters while a response is read.

use bytes::BytesMut;

/// Receives response body data as it arrives instead of having it buffered.
///
/// The socket adapter calls `process` once per decoded chunk (or per read for
/// length-delimited bodies); the libcurl adapter once per write callback. Calls happen
/// on the thread that called `send`, inline with the read loop.
pub trait ChunkSink {
    /// `chunk` is only valid for the duration of the call; copy what you need.
    fn process(&mut self, chunk: &[u8]);
}

impl ChunkSink for Vec<u8> {
    fn process(&mut self, chunk: &[u8]) {
        self.extend_from_slice(chunk);
    }
}

impl ChunkSink for BytesMut {
    fn process(&mut self, chunk: &[u8]) {
        self.extend_from_slice(chunk);
    }
}

impl<S: ChunkSink + ?Sized> ChunkSink for &mut S {
    fn process(&mut self, chunk: &[u8]) {
        (**self).process(chunk);
    }
}

/// Collects raw header bytes delivered piecewise (one line per libcurl header callback).
#[cfg(feature = "curl")]
pub(crate) trait HeaderSink {
    fn header_line(&mut self, line: &[u8]);
}

#[cfg(feature = "curl")]
impl HeaderSink for BytesMut {
    fn header_line(&mut self, line: &[u8]) {
        self.extend_from_slice(line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_accumulates() {
        let mut v = Vec::new();
        v.process(b"hello");
        v.process(b"foo");
        assert_eq!(v, b"hellofoo");
    }

    #[test]
    fn forwards_through_dyn_reference() {
        fn feed<S: ChunkSink>(mut sink: S) {
            sink.process(b"ab");
        }
        let mut buf = BytesMut::new();
        feed(&mut buf as &mut dyn ChunkSink);
        assert_eq!(&buf[..], b"ab");
    }

    #[cfg(feature = "curl")]
    #[test]
    fn header_lines_accumulate_verbatim() {
        let mut head = BytesMut::new();
        head.header_line(b"HTTP/1.1 200 OK\r\n");
        head.header_line(b"ETag: \"1-a\"\r\n");
        head.header_line(b"\r\n");
        assert_eq!(&head[..], b"HTTP/1.1 200 OK\r\nETag: \"1-a\"\r\n\r\n");
    }
}
