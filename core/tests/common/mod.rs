/*
 * common/mod.rs
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

//! Loopback server for transport tests: accepts connections in order and answers
//! each request on a connection with the next scripted reply.

#![allow(dead_code)]

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use couchwire_core::Endpoint;

/// One request as the server saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub head: String,
    pub body: Vec<u8>,
    pub connection: usize,
}

impl Seen {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or("")
    }

    /// First value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (n, v) = line.split_once(':')?;
            n.eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }
}

pub struct Server {
    pub endpoint: Endpoint,
    seen: Arc<Mutex<Vec<Seen>>>,
    handle: Option<JoinHandle<()>>,
}

impl Server {
    /// `connections[i]` are the replies written on the i-th accepted connection.
    /// The connection is closed after its last reply.
    pub fn start(connections: Vec<Vec<&'static str>>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let handle = thread::spawn(move || {
            for (index, replies) in connections.into_iter().enumerate() {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut writer = stream;
                for reply in replies {
                    let (head, body) = read_request(&mut reader);
                    log.lock().unwrap().push(Seen {
                        head,
                        body,
                        connection: index,
                    });
                    writer.write_all(reply.as_bytes()).unwrap();
                    writer.flush().unwrap();
                }
                // Swallow what is still unread (a trailing CRLF) so closing sends FIN, not RST.
                let _ = writer.set_read_timeout(Some(Duration::from_millis(50)));
                let mut rest = Vec::new();
                let _ = reader.read_to_end(&mut rest);
            }
        });
        Self {
            endpoint: Endpoint::parse(&format!("tcp://127.0.0.1:{}", port)).unwrap(),
            seen,
            handle: Some(handle),
        }
    }

    /// Wait for the script to finish and return what was received.
    pub fn finish(mut self) -> Vec<Seen> {
        if let Some(handle) = self.handle.take() {
            handle.join().expect("server thread panicked");
        }
        let seen = self.seen.lock().unwrap();
        seen.clone()
    }
}

fn read_request<R: BufRead>(reader: &mut R) -> (String, Vec<u8>) {
    let mut head = String::new();
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).unwrap();
        assert!(n > 0, "client closed before a full request");
        if line == "\r\n" || line == "\n" {
            // Blank lines before a request line are the CRLF that ends the previous body.
            if head.is_empty() {
                continue;
            }
            break;
        }
        head.push_str(&line);
    }
    let length = head
        .lines()
        .skip(1)
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().unwrap())
        })
        .unwrap_or(0);
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).unwrap();
    (head, body)
}
