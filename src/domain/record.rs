use crate::error::{GatewayError, PaymentError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// The lifecycle call that produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "SetPaydollarCheckout")]
    Register,
    #[serde(rename = "GetPaydollarCheckoutDetails")]
    Fetch,
    #[serde(rename = "DoPaydollarCheckoutPayment")]
    Confirm,
    #[serde(rename = "DoCapture")]
    Capture,
    #[serde(rename = "DoVoid")]
    Void,
}

impl Method {
    /// Value sent as the `METHOD` request parameter.
    pub const fn api_name(&self) -> &'static str {
        match self {
            Method::Register => "SetPaydollarCheckout",
            Method::Fetch => "GetPaydollarCheckoutDetails",
            Method::Confirm => "DoPaydollarCheckoutPayment",
            Method::Capture => "DoCapture",
            Method::Void => "DoVoid",
        }
    }

    /// Keys holding the amount and currency of a successful call, in lookup order.
    /// Register reads them back from its own request.
    fn money_fields(&self) -> Option<(&'static [&'static str], &'static [&'static str])> {
        match self {
            Method::Register => Some((
                &["PAYMENTREQUEST_0_AMT"],
                &["PAYMENTREQUEST_0_CURRENCYCODE"],
            )),
            Method::Fetch => Some((
                &["AMT", "PAYMENTREQUEST_0_AMT"],
                &["CURRENCYCODE", "PAYMENTREQUEST_0_CURRENCYCODE"],
            )),
            Method::Confirm => Some((
                &["PAYMENTINFO_0_AMT", "AMT"],
                &["PAYMENTINFO_0_CURRENCYCODE", "CURRENCYCODE"],
            )),
            Method::Capture => Some((&["AMT"], &["CURRENCYCODE"])),
            Method::Void => None,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// How the processor should settle a confirmed payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentAction {
    #[default]
    Sale,
    Authorization,
    Order,
}

impl PaymentAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentAction::Sale => "Sale",
            PaymentAction::Authorization => "Authorization",
            PaymentAction::Order => "Order",
        }
    }
}

impl FromStr for PaymentAction {
    type Err = PaymentError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Sale" => Ok(PaymentAction::Sale),
            "Authorization" => Ok(PaymentAction::Authorization),
            "Order" => Ok(PaymentAction::Order),
            other => Err(PaymentError::Configuration(format!(
                "'{other}' is not a valid payment action"
            ))),
        }
    }
}

impl fmt::Display for PaymentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A decoded gateway response.
///
/// Keys may repeat on the wire, so every key maps to all of its values in
/// the order they appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Context(BTreeMap<String, Vec<String>>);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    /// First value recorded under `key`.
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0.get(key).map(Vec::as_slice)
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

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// First value of the first key present, with that key.
    pub fn first_of<'a>(&'a self, keys: &[&'a str]) -> Option<(&'a str, &'a str)> {
        keys.iter()
            .find_map(|key| self.first(key).map(|value| (*key, value)))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Context::new();
        for (key, value) in iter {
            context.push(key, value);
        }
        context
    }
}

/// One request/response round trip with the gateway.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub method: Method,
    /// Token known from the request side. Register leaves this empty and the
    /// gateway assigns one in its response.
    pub token: Option<String>,
    pub request: BTreeMap<String, String>,
    /// Request body with credentials masked.
    pub raw_request: String,
    pub raw_response: String,
    pub context: Context,
    pub response_time: Duration,
}

/// The observed state of one remote transaction after one lifecycle call.
///
/// Records are never modified after construction. A later call on the same
/// transaction produces a new record under the same `(token, method)` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    token: String,
    method: Method,
    version: Option<String>,
    ack: String,
    correlation_id: Option<String>,
    amount: Option<Decimal>,
    currency: Option<String>,
    error_code: Option<String>,
    error_message: Option<String>,
    raw_request: String,
    raw_response: String,
    response_time: Duration,
    context: Context,
    created_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Builds a record from a decoded exchange.
    ///
    /// Amount and currency are only read from successful responses; a
    /// successful response missing them, or carrying a non-numeric amount,
    /// fails with [`PaymentError::Decode`].
    pub fn from_exchange(exchange: Exchange) -> Result<Self> {
        let Exchange {
            method,
            token,
            request,
            raw_request,
            raw_response,
            context,
            response_time,
        } = exchange;

        let ack = context
            .first("ACK")
            .ok_or_else(|| GatewayError::MalformedResponse("response carries no ACK".into()))?
            .to_string();
        let token = token
            .or_else(|| context.first("TOKEN").map(str::to_string))
            .ok_or_else(|| GatewayError::MalformedResponse("response carries no TOKEN".into()))?;

        let mut record = Self {
            token,
            method,
            version: request.get("VERSION").cloned(),
            correlation_id: context.first("CORRELATIONID").map(str::to_string),
            amount: None,
            currency: None,
            error_code: None,
            error_message: None,
            raw_request,
            raw_response,
            response_time,
            created_at: Utc::now(),
            ack,
            context,
        };

        if record.is_successful() {
            if let Some((amount_keys, currency_keys)) = method.money_fields() {
                let request_fields: Context;
                let source = if method == Method::Register {
                    request_fields = request.into_iter().collect();
                    &request_fields
                } else {
                    &record.context
                };
                let amount = parse_amount(source, amount_keys)?;
                let currency = source
                    .first_of(currency_keys)
                    .map(|(_, value)| value.to_string())
                    .ok_or_else(|| PaymentError::decode(currency_keys[0], "field is missing"))?;
                record.amount = Some(amount);
                record.currency = Some(currency);
            }
        } else {
            record.error_code = record.context.first("L_ERRORCODE0").map(str::to_string);
            record.error_message = record
                .context
                .first_of(&["L_LONGMESSAGE0", "L_SHORTMESSAGE0"])
                .map(|(_, value)| value.to_string());
        }

        Ok(record)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn ack(&self) -> &str {
        &self.ack
    }

    pub fn is_successful(&self) -> bool {
        is_success_ack(&self.ack)
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    pub fn amount(&self) -> Option<Decimal> {
        self.amount
    }

    pub fn currency(&self) -> Option<&str> {
        self.currency.as_deref()
    }

    pub fn error_code(&self) -> Option<&str> {
        self.error_code.as_deref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn raw_request(&self) -> &str {
        &self.raw_request
    }

    pub fn raw_response(&self) -> &str {
        &self.raw_response
    }

    pub fn response_time(&self) -> Duration {
        self.response_time
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// First response value for `key`.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.context.first(key)
    }

    /// Response value for `key` read as a decimal amount.
    pub fn decimal(&self, key: &str) -> Result<Decimal> {
        parse_amount(&self.context, &[key])
    }

    /// The processor's id for the settled payment, needed to capture or void it.
    pub fn transaction_id(&self) -> Option<&str> {
        self.context
            .first_of(&["PAYMENTINFO_0_TRANSACTIONID", "TRANSACTIONID"])
            .map(|(_, value)| value)
    }

    pub fn declined(&self) -> GatewayError {
        GatewayError::Declined {
            code: self.error_code.clone().unwrap_or_default(),
            message: self.error_message.clone().unwrap_or_default(),
            correlation_id: self.correlation_id.clone(),
        }
    }
}

/// Whether an `ACK` value reports a completed call.
pub fn is_success_ack(ack: &str) -> bool {
    matches!(ack, "Success" | "SuccessWithWarning")
}

fn parse_amount(source: &Context, keys: &[&str]) -> Result<Decimal> {
    let (key, value) = source
        .first_of(keys)
        .ok_or_else(|| PaymentError::decode(keys[0], "field is missing"))?;
    Decimal::from_str(value)
        .map_err(|e| PaymentError::decode(key, format!("'{value}' is not a decimal amount: {e}")))
}
