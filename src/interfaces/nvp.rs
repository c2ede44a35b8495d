use crate::domain::record::Context;
use crate::error::GatewayError;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use url::form_urlencoded;

const MASKED_KEYS: [&str; 2] = ["PWD", "SIGNATURE"];
const MASK: &str = "XXXXXX";

/// A typed request value, rendered the way the gateway expects it.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    /// Sent as `1` or `0`.
    Flag(bool),
    Int(i64),
    /// Sent with exactly two decimal places.
    Money(Decimal),
}

impl ParamValue {
    pub fn encode(&self) -> String {
        match self {
            ParamValue::Text(text) => text.clone(),
            ParamValue::Flag(flag) => (if *flag { "1" } else { "0" }).to_string(),
            ParamValue::Int(value) => value.to_string(),
            ParamValue::Money(amount) => format_money(*amount),
        }
    }
}

pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    // Negated zero keeps its sign bit and would render as "-0.00".
    if rounded.is_zero() {
        return format!("{:.2}", Decimal::ZERO);
    }
    format!("{rounded:.2}")
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Flag(value)
    }
}

impl From<u32> for ParamValue {
    fn from(value: u32) -> Self {
        ParamValue::Int(value.into())
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<Decimal> for ParamValue {
    fn from(value: Decimal) -> Self {
        ParamValue::Money(value)
    }
}

/// A request parameter set. Keys that are never set are never sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(BTreeMap<String, String>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> &mut Self {
        self.0.insert(key.into(), value.into().encode());
        self
    }

    pub fn set_opt<V: Into<ParamValue>>(
        &mut self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> &mut Self {
        if let Some(value) = value {
            self.set(key, value);
        }
        self
    }

    /// Sets a text value unless it is blank.
    pub fn set_non_empty(&mut self, key: impl Into<String>, value: &str) -> &mut Self {
        if !value.trim().is_empty() {
            self.set(key, value);
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Overlays caller-supplied parameters. On conflict the caller wins.
    pub fn merge(&mut self, extra: &BTreeMap<String, ParamValue>) -> &mut Self {
        for (key, value) in extra {
            self.0.insert(key.clone(), value.encode());
        }
        self
    }

    /// Adds every parameter of `other`, replacing values already present.
    pub fn extend(&mut self, other: Params) -> &mut Self {
        self.0.extend(other.0);
        self
    }

    /// URL-form encoding of the full set, as posted to the gateway.
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }

    /// Encoding with credentials blanked out, safe to persist or log.
    pub fn masked(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter().map(|(key, value)| {
                if MASKED_KEYS.contains(&key.as_str()) {
                    (key.as_str(), MASK)
                } else {
                    (key.as_str(), value.as_str())
                }
            }))
            .finish()
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }
}

/// Decodes a gateway response body.
///
/// The body is a single URL-form-encoded line of `key=value` pairs. Keys may
/// repeat; all values are kept in order under their key.
pub fn decode(body: &str) -> Result<Context, GatewayError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(GatewayError::MalformedResponse("empty response body".into()));
    }
    for segment in body.split('&').filter(|segment| !segment.is_empty()) {
        match segment.split_once('=') {
            Some((key, _)) if !key.is_empty() => {}
            _ => {
                return Err(GatewayError::MalformedResponse(format!(
                    "'{segment}' is not a key=value pair"
                )));
            }
        }
    }
    Ok(form_urlencoded::parse(body.as_bytes())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect())
}
