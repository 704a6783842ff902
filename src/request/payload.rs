//! Turns a logical request body into its wire form for a given method.
//!
//! Read methods carry their fields in the query string; write methods carry them as JSON,
//! URL-encoded text or multipart depending on the method and the requested content type.

use reqwest::Method;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::errors::Error;
use crate::transport::EncodedBody;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// A loosely typed payload value.
#[derive(Debug, Clone, PartialEq)]
pub enum PayloadValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
    List(Vec<PayloadValue>),
    Map(FieldMap),
}

/// Ordered key/value mapping; iteration order is insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap(Vec<(String, PayloadValue)>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key`, replacing an existing entry in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PayloadValue>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<PayloadValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PayloadValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Flattens into `(key, value)` string pairs: `key[0]` for list items, `parent.child` for
    /// nested maps, nulls dropped, booleans as `1`/`0`.
    pub fn flatten(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        for (key, value) in &self.0 {
            flatten_into(key.clone(), value, &mut out);
        }
        out
    }
}

fn flatten_into(key: String, value: &PayloadValue, out: &mut Vec<(String, String)>) {
    match value {
        PayloadValue::Null => {}
        PayloadValue::Bool(b) => out.push((key, if *b { "1" } else { "0" }.to_string())),
        PayloadValue::Number(n) => out.push((key, n.to_string())),
        PayloadValue::Text(s) => out.push((key, s.clone())),
        PayloadValue::List(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten_into(format!("{key}[{i}]"), item, out);
            }
        }
        PayloadValue::Map(map) => {
            for (child, item) in &map.0 {
                flatten_into(format!("{key}.{child}"), item, out);
            }
        }
    }
}

impl<K: Into<String>, V: Into<PayloadValue>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl From<serde_json::Map<String, serde_json::Value>> for FieldMap {
    fn from(map: serde_json::Map<String, serde_json::Value>) -> Self {
        map.into_iter().collect()
    }
}

impl From<serde_json::Value> for PayloadValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => PayloadValue::Null,
            serde_json::Value::Bool(b) => PayloadValue::Bool(b),
            serde_json::Value::Number(n) => PayloadValue::Number(n),
            serde_json::Value::String(s) => PayloadValue::Text(s),
            serde_json::Value::Array(items) => {
                PayloadValue::List(items.into_iter().map(PayloadValue::from).collect())
            }
            serde_json::Value::Object(map) => PayloadValue::Map(map.into()),
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(s: &str) -> Self {
        PayloadValue::Text(s.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(s: String) -> Self {
        PayloadValue::Text(s)
    }
}

impl From<bool> for PayloadValue {
    fn from(b: bool) -> Self {
        PayloadValue::Bool(b)
    }
}

impl From<i64> for PayloadValue {
    fn from(n: i64) -> Self {
        PayloadValue::Number(n.into())
    }
}

impl From<u64> for PayloadValue {
    fn from(n: u64) -> Self {
        PayloadValue::Number(n.into())
    }
}

impl<T: Into<PayloadValue>> From<Option<T>> for PayloadValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(PayloadValue::Null)
    }
}

impl<T: Into<PayloadValue>> From<Vec<T>> for PayloadValue {
    fn from(items: Vec<T>) -> Self {
        PayloadValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl From<FieldMap> for PayloadValue {
    fn from(map: FieldMap) -> Self {
        PayloadValue::Map(map)
    }
}

impl Serialize for PayloadValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PayloadValue::Null => serializer.serialize_unit(),
            PayloadValue::Bool(b) => serializer.serialize_bool(*b),
            PayloadValue::Number(n) => n.serialize(serializer),
            PayloadValue::Text(s) => serializer.serialize_str(s),
            PayloadValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            PayloadValue::Map(map) => map.serialize(serializer),
        }
    }
}

impl Serialize for FieldMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            out.serialize_entry(k, v)?;
        }
        out.end()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartValue {
    Text(String),
    File {
        bytes: Vec<u8>,
        file_name: String,
        mime: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MultipartPart {
    pub name: String,
    pub value: PartValue,
}

/// A multipart body prepared by the caller (or derived from flattened fields).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartPayload {
    pub parts: Vec<MultipartPart>,
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            value: PartValue::Text(value.into()),
        });
        self
    }

    pub fn file(
        mut self,
        name: impl Into<String>,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
        mime: Option<String>,
    ) -> Self {
        self.parts.push(MultipartPart {
            name: name.into(),
            value: PartValue::File {
                bytes,
                file_name: file_name.into(),
                mime,
            },
        });
        self
    }

    fn from_pairs(pairs: Vec<(String, String)>) -> Self {
        pairs
            .into_iter()
            .fold(Self::new(), |payload, (k, v)| payload.text(k, v))
    }
}

/// The logical body of a request.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Fields(FieldMap),
    Multipart(MultipartPayload),
    Raw(String),
}

impl RequestBody {
    /// Objects become fields, strings are sent verbatim, null is no body.
    pub fn json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => RequestBody::Empty,
            serde_json::Value::Object(map) => RequestBody::Fields(map.into()),
            serde_json::Value::String(s) => RequestBody::Raw(s),
            other => RequestBody::Raw(other.to_string()),
        }
    }
}

impl From<FieldMap> for RequestBody {
    fn from(map: FieldMap) -> Self {
        RequestBody::Fields(map)
    }
}

impl From<MultipartPayload> for RequestBody {
    fn from(payload: MultipartPayload) -> Self {
        RequestBody::Multipart(payload)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPayload {
    /// Query fragment to append to the URL, without the leading `?`.
    pub query: Option<String>,
    pub body: EncodedBody,
    /// Content type chosen by the encoder; `None` leaves the decision to the caller's headers
    /// or, for multipart, to the transport.
    pub content_type: Option<&'static str>,
}

impl EncodedPayload {
    fn empty() -> Self {
        Self {
            query: None,
            body: EncodedBody::Empty,
            content_type: None,
        }
    }

    /// Appends the query fragment to `url`.
    pub fn apply_query(&self, url: &str) -> String {
        match &self.query {
            Some(query) if !query.is_empty() => {
                let sep = if url.contains('?') { '&' } else { '?' };
                format!("{url}{sep}{query}")
            }
            _ => url.to_string(),
        }
    }
}

/// Methods that carry no body; their payload travels in the query string.
pub fn is_read_method(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

pub fn url_encode_pairs(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Encodes `body` for `method`. `wants_json` reflects whether the outgoing headers ask for a
/// JSON body.
pub fn encode_payload(
    method: &Method,
    body: &RequestBody,
    wants_json: bool,
) -> Result<EncodedPayload, Error> {
    if is_read_method(method) {
        let query = match body {
            RequestBody::Empty => None,
            RequestBody::Fields(fields) => Some(url_encode_pairs(&fields.flatten())),
            RequestBody::Raw(raw) => Some(raw.trim_start_matches('?').to_string()),
            RequestBody::Multipart(_) => {
                return Err(Error::Payload(format!(
                    "multipart payload cannot be sent with {method}"
                )));
            }
        };
        return Ok(EncodedPayload {
            query,
            ..EncodedPayload::empty()
        });
    }

    let encoded = match body {
        RequestBody::Empty => EncodedPayload::empty(),
        RequestBody::Raw(raw) => EncodedPayload {
            body: EncodedBody::Text(raw.clone()),
            ..EncodedPayload::empty()
        },
        RequestBody::Multipart(payload) => EncodedPayload {
            body: EncodedBody::Multipart(payload.clone()),
            ..EncodedPayload::empty()
        },
        RequestBody::Fields(fields) if wants_json => EncodedPayload {
            body: EncodedBody::Text(serde_json::to_string(fields)?),
            content_type: Some(JSON_CONTENT_TYPE),
            ..EncodedPayload::empty()
        },
        RequestBody::Fields(fields) if *method == Method::PATCH || *method == Method::DELETE => {
            EncodedPayload {
                body: EncodedBody::Text(url_encode_pairs(&fields.flatten())),
                content_type: Some(FORM_CONTENT_TYPE),
                ..EncodedPayload::empty()
            }
        }
        RequestBody::Fields(fields) => EncodedPayload {
            body: EncodedBody::Multipart(MultipartPayload::from_pairs(fields.flatten())),
            ..EncodedPayload::empty()
        },
    };
    Ok(encoded)
}
