//! Parameter projection: query parameters → outbound request body.
//!
//! # Responsibilities
//! - Hold the multi-valued, order-preserving parameter mapping
//! - Pick a body encoding from the route's header value hints
//! - Serialize parameters as JSON or form-urlencoded
//!
//! # Design Decisions
//! - The first hint wins, scanning rules in order, then values in order
//! - JSON values are typed: integers, `true`/`false`, otherwise strings
//! - XML is recognised but unsupported; the body is left untouched

use serde_json::{Map, Value};
use url::form_urlencoded;

use crate::config::CustomHeaderRule;
use crate::error::ProxyResult;
use crate::routing::ResolvedRoute;

/// Query parameters grouped by key, in first-seen key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters {
    entries: Vec<(String, Vec<String>)>,
}

impl Parameters {
    /// Parse a raw query string (without the leading `?`).
    pub fn parse(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.push(key.into_owned(), value.into_owned());
        }
        params
    }

    /// Add one value, keeping earlier values for the same key.
    pub fn push(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, values)| values.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(key, values)| (key.as_str(), values.as_slice()))
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Body encodings a route can ask for through its header values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyEncoding {
    Json,
    FormUrlEncoded,
    Xml,
}

impl BodyEncoding {
    /// Recognise a content-type hint. Parameters after `;` are ignored.
    pub fn from_hint(value: &str) -> Option<Self> {
        let media_type = value.split(';').next().unwrap_or_default().trim();

        if media_type.eq_ignore_ascii_case("application/json") {
            Some(BodyEncoding::Json)
        } else if media_type.eq_ignore_ascii_case("application/x-www-form-urlencoded") {
            Some(BodyEncoding::FormUrlEncoded)
        } else if media_type.eq_ignore_ascii_case("application/xml") {
            Some(BodyEncoding::Xml)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BodyEncoding::Json => "application/json",
            BodyEncoding::FormUrlEncoded => "application/x-www-form-urlencoded",
            BodyEncoding::Xml => "application/xml",
        }
    }
}

/// First encoding hinted at by the rules, in rule then value order.
pub fn select_encoding(rules: &[CustomHeaderRule]) -> Option<BodyEncoding> {
    rules
        .iter()
        .flat_map(|rule| rule.values.iter())
        .find_map(|value| BodyEncoding::from_hint(value))
}

/// A serialized replacement body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectedBody {
    pub encoding: BodyEncoding,
    /// Raw serialized text, also used for diagnostics.
    pub raw: String,
}

/// What the projector decided for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// Keep the inbound body.
    Unchanged,
    /// The route asked for an encoding that is not implemented.
    Unsupported(BodyEncoding),
    /// Replace the inbound body.
    Replaced(ProjectedBody),
}

/// Project the route's parameters into a body, if the route asks for it.
pub fn project(route: &ResolvedRoute<'_>) -> ProxyResult<Projection> {
    if !route.is_active() || !route.copy_parameters() {
        return Ok(Projection::Unchanged);
    }

    let Some(encoding) = select_encoding(route.custom_headers()) else {
        return Ok(Projection::Unchanged);
    };

    let raw = match encoding {
        BodyEncoding::Json => encode_json(route.parameters())?,
        BodyEncoding::FormUrlEncoded => encode_form(route.parameters()),
        BodyEncoding::Xml => {
            tracing::warn!(
                path = route.path().unwrap_or_default(),
                "Not implemented: copying parameters for application/xml is not supported"
            );
            return Ok(Projection::Unsupported(encoding));
        }
    };

    tracing::debug!(encoding = encoding.as_str(), body = %raw, "Projected parameters into body");
    Ok(Projection::Replaced(ProjectedBody { encoding, raw }))
}

/// One flat object: single values become scalars, repeated keys arrays.
pub fn encode_json(params: &Parameters) -> ProxyResult<String> {
    let mut object = Map::with_capacity(params.len());

    for (key, values) in params.iter() {
        let value = match values {
            [single] => classify(single),
            many => Value::Array(many.iter().map(|v| classify(v)).collect()),
        };
        object.insert(key.to_string(), value);
    }

    Ok(serde_json::to_string(&Value::Object(object))?)
}

fn classify(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

/// Standard form encoding with repeated keys for multi-valued parameters.
pub fn encode_form(params: &Parameters) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, values) in params.iter() {
        for value in values {
            serializer.append_pair(key, value);
        }
    }
    serializer.finish()
}
