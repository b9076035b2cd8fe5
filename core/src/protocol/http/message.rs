/*
 * message.rs
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

//! Header and body storage shared by requests and responses.
//!
//! Headers are keyed by lowercase name and serialized in that order, so the wire
//! form of a message does not depend on the order headers were set.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::protocol::http::registry::{is_token, MessageKind, Registries};

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderField {
    name: String,
    values: Vec<String>,
}

/// Headers + raw body of one message, validated against the registry for its kind.
#[derive(Debug, Clone)]
pub struct Envelope {
    kind: MessageKind,
    registries: Arc<Registries>,
    headers: BTreeMap<String, HeaderField>,
    body: Bytes,
}

/// `content-type` → `Content-Type`.
pub fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, segment) in name.split('-').enumerate() {
        if i > 0 {
            out.push('-');
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars.map(|c| c.to_ascii_lowercase()));
        }
    }
    out
}

fn check_value(name: &str, value: &str) -> Result<()> {
    if value.contains(['\r', '\n', '\0']) {
        return Err(Error::invalid_argument(format!(
            "value of header field {} contains a control character",
            name
        )));
    }
    Ok(())
}

impl Envelope {
    pub fn new(kind: MessageKind, registries: Arc<Registries>) -> Self {
        Self {
            kind,
            registries,
            headers: BTreeMap::new(),
            body: Bytes::new(),
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn registries(&self) -> &Arc<Registries> {
        &self.registries
    }

    /// Resolve `name` to its registered casing, checking it is legal for this kind.
    fn registered_name(&self, name: &str) -> Result<String> {
        if !is_token(name) {
            return Err(Error::invalid_argument(format!("invalid header field name {:?}", name)));
        }
        self.registries
            .headers(self.kind)
            .canonical(name)
            .map(str::to_string)
            .ok_or_else(|| Error::UnsupportedHeaderField(name.to_string()))
    }

    /// Set (replace) a header. Fails unless the name is registered for this kind.
    pub fn set_header_field(&mut self, name: &str, value: &str) -> Result<()> {
        let canonical = self.registered_name(name)?;
        check_value(name, value)?;
        self.headers.insert(
            name.to_ascii_lowercase(),
            HeaderField {
                name: canonical,
                values: vec![value.to_string()],
            },
        );
        Ok(())
    }

    /// Set several headers. Either all are applied or none.
    pub fn set_multiple_header_fields_at_once<I, K, V>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut staged = Vec::new();
        for (name, value) in fields {
            let (name, value) = (name.as_ref(), value.as_ref());
            let canonical = self.registered_name(name)?;
            check_value(name, value)?;
            staged.push((name.to_ascii_lowercase(), canonical, value.to_string()));
        }
        for (key, name, value) in staged {
            self.headers.insert(
                key,
                HeaderField {
                    name,
                    values: vec![value],
                },
            );
        }
        Ok(())
    }

    /// Set headers from a JSON object whose values are all strings.
    pub fn set_header_fields_from_json(&mut self, fields: &Value) -> Result<()> {
        let object = fields
            .as_object()
            .ok_or_else(|| Error::invalid_argument("header fields must be a JSON object"))?;
        let mut pairs = Vec::with_capacity(object.len());
        for (name, value) in object {
            let value = value.as_str().ok_or_else(|| {
                Error::invalid_argument(format!("value of header field {} is not a string", name))
            })?;
            pairs.push((name.as_str(), value));
        }
        self.set_multiple_header_fields_at_once(pairs)
    }

    /// Store a header read off the wire. The name is title-cased and repeated
    /// names accumulate; the registry is not consulted.
    pub(crate) fn append_parsed_header(&mut self, name: &str, value: &str) {
        let key = name.to_ascii_lowercase();
        match self.headers.get_mut(&key) {
            Some(field) => field.values.push(value.to_string()),
            None => {
                self.headers.insert(
                    key,
                    HeaderField {
                        name: title_case(name),
                        values: vec![value.to_string()],
                    },
                );
            }
        }
    }

    /// First value of the header, or `None` when absent.
    pub fn header_field_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|f| f.values.first())
            .map(String::as_str)
    }

    /// All values of a repeated header, in arrival order.
    pub fn header_field_values(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|f| f.values.as_slice())
            .unwrap_or(&[])
    }

    pub fn has_header_field(&self, name: &str) -> bool {
        self.headers.contains_key(&name.to_ascii_lowercase())
    }

    pub fn remove_header_field(&mut self, name: &str) -> bool {
        self.headers.remove(&name.to_ascii_lowercase()).is_some()
    }

    /// `(name, value)` pairs in serialization order; repeated headers yield one pair per value.
    pub fn header_fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.headers
            .values()
            .flat_map(|f| f.values.iter().map(move |v| (f.name.as_str(), v.as_str())))
    }

    /// Append `Name: value\r\n` for every header.
    pub fn write_header_lines(&self, out: &mut Vec<u8>) {
        for (name, value) in self.header_fields() {
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(b": ");
            out.extend_from_slice(value.as_bytes());
            out.extend_from_slice(b"\r\n");
        }
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    pub fn has_body(&self) -> bool {
        !self.body.is_empty()
    }

    /// Body length in bytes.
    pub fn body_length(&self) -> usize {
        self.body.len()
    }
}

/// Accessors common to [`Request`](super::Request) and [`Response`](super::Response).
pub trait HttpMessage {
    fn envelope(&self) -> &Envelope;

    fn envelope_mut(&mut self) -> &mut Envelope;

    fn set_header_field(&mut self, name: &str, value: &str) -> Result<()> {
        self.envelope_mut().set_header_field(name, value)
    }

    fn set_multiple_header_fields_at_once<I, K, V>(&mut self, fields: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
        Self: Sized,
    {
        self.envelope_mut().set_multiple_header_fields_at_once(fields)
    }

    fn set_header_fields_from_json(&mut self, fields: &Value) -> Result<()> {
        self.envelope_mut().set_header_fields_from_json(fields)
    }

    fn header_field_value(&self, name: &str) -> Option<&str> {
        self.envelope().header_field_value(name)
    }

    fn header_field_values(&self, name: &str) -> &[String] {
        self.envelope().header_field_values(name)
    }

    fn has_header_field(&self, name: &str) -> bool {
        self.envelope().has_header_field(name)
    }

    fn remove_header_field(&mut self, name: &str) -> bool {
        self.envelope_mut().remove_header_field(name)
    }

    fn body(&self) -> &Bytes {
        self.envelope().body()
    }

    fn has_body(&self) -> bool {
        self.envelope().has_body()
    }

    fn body_length(&self) -> usize {
        self.envelope().body_length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_envelope() -> Envelope {
        Envelope::new(MessageKind::Request, Registries::standard())
    }

    #[test]
    fn title_cases_each_segment() {
        assert_eq!(title_case("content-type"), "Content-Type");
        assert_eq!(title_case("X-COUCH-FULL-COMMIT"), "X-Couch-Full-Commit");
        assert_eq!(title_case("etag"), "Etag");
    }

    #[test]
    fn unregistered_field_fails_until_registered() {
        let mut env = request_envelope();
        assert!(matches!(
            env.set_header_field("X-Request-Tag", "a"),
            Err(Error::UnsupportedHeaderField(name)) if name == "X-Request-Tag"
        ));

        let mut registries = Registries::standard();
        Arc::make_mut(&mut registries)
            .add_custom_header_field(MessageKind::Request, "X-Request-Tag")
            .unwrap();
        let mut env = Envelope::new(MessageKind::Request, registries);
        env.set_header_field("X-Request-Tag", "a").unwrap();
        assert_eq!(env.header_field_value("x-request-tag"), Some("a"));
    }

    #[test]
    fn response_only_fields_rejected_on_requests() {
        let mut env = request_envelope();
        assert!(env.set_header_field("ETag", "\"1\"").is_err());
    }

    #[test]
    fn absent_header_is_none() {
        let env = request_envelope();
        assert_eq!(env.header_field_value("Accept"), None);
        assert!(!env.has_header_field("Accept"));
        assert!(env.header_field_values("Accept").is_empty());
    }

    #[test]
    fn output_uses_registered_casing_in_stable_order() {
        let mut env = request_envelope();
        env.set_header_field("user-agent", "t").unwrap();
        env.set_header_field("te", "trailers").unwrap();
        env.set_header_field("ACCEPT", "application/json").unwrap();
        let mut out = Vec::new();
        env.write_header_lines(&mut out);
        assert_eq!(
            out,
            b"Accept: application/json\r\nTE: trailers\r\nUser-Agent: t\r\n".to_vec()
        );
    }

    #[test]
    fn rejects_line_breaks_in_values() {
        let mut env = request_envelope();
        assert!(matches!(
            env.set_header_field("Accept", "a\r\nHost: evil"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn multiple_fields_are_all_or_nothing() {
        let mut env = request_envelope();
        let result = env.set_multiple_header_fields_at_once([
            ("Accept", "text/plain"),
            ("Not-Registered", "x"),
        ]);
        assert!(result.is_err());
        assert!(!env.has_header_field("Accept"));

        env.set_multiple_header_fields_at_once(vec![
            ("Accept".to_string(), "text/plain".to_string()),
            ("Destination".to_string(), "doc2".to_string()),
        ])
        .unwrap();
        assert_eq!(env.header_field_value("destination"), Some("doc2"));
    }

    #[test]
    fn json_header_map_must_be_flat_strings() {
        let mut env = request_envelope();
        assert!(env.set_header_fields_from_json(&json!(["Accept"])).is_err());
        assert!(env
            .set_header_fields_from_json(&json!({"Accept": {"nested": "x"}}))
            .is_err());
        assert!(env.set_header_fields_from_json(&json!({"Content-Length": 3})).is_err());
        env.set_header_fields_from_json(&json!({"Content-Type": "application/json"}))
            .unwrap();
        assert_eq!(env.header_field_value("Content-Type"), Some("application/json"));
    }

    #[test]
    fn parsed_headers_accumulate() {
        let mut env = Envelope::new(MessageKind::Response, Registries::standard());
        env.append_parsed_header("set-cookie", "a=1");
        env.append_parsed_header("Set-Cookie", "b=2");
        assert_eq!(env.header_field_values("SET-COOKIE"), ["a=1", "b=2"]);
        assert_eq!(env.header_field_value("set-cookie"), Some("a=1"));
        let names: Vec<_> = env.header_fields().map(|(n, _)| n).collect();
        assert_eq!(names, ["Set-Cookie", "Set-Cookie"]);
    }

    #[test]
    fn body_length_counts_bytes() {
        let mut env = request_envelope();
        assert!(!env.has_body());
        env.set_body("héllo".as_bytes().to_vec());
        assert!(env.has_body());
        assert_eq!(env.body_length(), 6);
    }
}
