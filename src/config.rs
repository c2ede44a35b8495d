//! Gateway configuration.
//!
//! Everything the client needs is carried by [`GatewayConfig`] and handed to
//! it at construction time. [`GatewayConfig::from_env`] fills the struct from
//! `PAYDOLLAR_*` variables over sandbox defaults.

use crate::domain::record::PaymentAction;
use crate::error::{PaymentError, Result};
use std::fmt;

pub const SANDBOX_ENDPOINT: &str = "https://api-3t.sandbox.paydollar.com/nvp";
pub const SANDBOX_CHECKOUT_URL: &str = "https://www.sandbox.paydollar.com/webscr";
pub const DEFAULT_API_VERSION: &str = "88.0";
pub const DEFAULT_CURRENCY: &str = "GBP";
pub const DEFAULT_CALLBACK_TIMEOUT: u32 = 3;
pub const DEFAULT_ALLOW_NOTE: bool = true;

/// API credentials sent with every call.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub signature: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .field("signature", &"***")
            .finish()
    }
}

/// Options controlling the hosted checkout page.
///
/// Unset options are not sent, except `callback_timeout` and `allow_note`
/// which fall back to [`DEFAULT_CALLBACK_TIMEOUT`] and [`DEFAULT_ALLOW_NOTE`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    pub locale_code: Option<String>,
    pub header_image: Option<String>,
    pub landing_page: Option<String>,
    pub req_confirm_shipping: Option<bool>,
    pub page_style: Option<String>,
    pub solution_type: Option<String>,
    pub brand_name: Option<String>,
    pub customer_service_number: Option<String>,
    pub callback_timeout: Option<u32>,
    pub allow_note: Option<bool>,
}

impl DisplayOptions {
    /// Fills every unset option from `fallback`.
    pub fn or(self, fallback: &DisplayOptions) -> DisplayOptions {
        DisplayOptions {
            locale_code: self.locale_code.or_else(|| fallback.locale_code.clone()),
            header_image: self.header_image.or_else(|| fallback.header_image.clone()),
            landing_page: self.landing_page.or_else(|| fallback.landing_page.clone()),
            req_confirm_shipping: self.req_confirm_shipping.or(fallback.req_confirm_shipping),
            page_style: self.page_style.or_else(|| fallback.page_style.clone()),
            solution_type: self.solution_type.or_else(|| fallback.solution_type.clone()),
            brand_name: self.brand_name.or_else(|| fallback.brand_name.clone()),
            customer_service_number: self
                .customer_service_number
                .or_else(|| fallback.customer_service_number.clone()),
            callback_timeout: self.callback_timeout.or(fallback.callback_timeout),
            allow_note: self.allow_note.or(fallback.allow_note),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// NVP API endpoint every call is posted to.
    pub endpoint: String,
    /// Hosted checkout page the customer is redirected to.
    pub checkout_url: String,
    pub credentials: Credentials,
    pub api_version: String,
    pub currency: String,
    /// Kept as configured; checked when a call needs it.
    pub payment_action: String,
    pub callback_https: bool,
    pub site_host: String,
    pub display: DisplayOptions,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: SANDBOX_ENDPOINT.to_string(),
            checkout_url: SANDBOX_CHECKOUT_URL.to_string(),
            credentials: Credentials::default(),
            api_version: DEFAULT_API_VERSION.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
            payment_action: PaymentAction::Sale.as_str().to_string(),
            callback_https: true,
            site_host: "localhost:8000".to_string(),
            display: DisplayOptions::default(),
        }
    }
}

impl GatewayConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from any key lookup, starting from the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(endpoint) = get("PAYDOLLAR_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(checkout_url) = get("PAYDOLLAR_CHECKOUT_URL") {
            config.checkout_url = checkout_url;
        }
        if let Some(username) = get("PAYDOLLAR_API_USERNAME") {
            config.credentials.username = username;
        }
        if let Some(password) = get("PAYDOLLAR_API_PASSWORD") {
            config.credentials.password = password;
        }
        if let Some(signature) = get("PAYDOLLAR_API_SIGNATURE") {
            config.credentials.signature = signature;
        }
        if let Some(version) = get("PAYDOLLAR_API_VERSION") {
            config.api_version = version;
        }
        if let Some(currency) = get("PAYDOLLAR_CURRENCY") {
            config.currency = currency;
        }
        if let Some(action) = get("PAYDOLLAR_PAYMENT_ACTION") {
            config.payment_action = action;
        }
        if let Some(value) = get("PAYDOLLAR_CALLBACK_HTTPS") {
            config.callback_https = parse_flag("PAYDOLLAR_CALLBACK_HTTPS", &value)?;
        }
        if let Some(host) = get("PAYDOLLAR_SITE_HOST") {
            config.site_host = host;
        }

        let display = &mut config.display;
        display.locale_code = get("PAYDOLLAR_LOCALE");
        display.header_image = get("PAYDOLLAR_HEADER_IMAGE");
        display.landing_page = get("PAYDOLLAR_LANDING_PAGE");
        display.page_style = get("PAYDOLLAR_PAGE_STYLE");
        display.solution_type = get("PAYDOLLAR_SOLUTION_TYPE");
        display.brand_name = get("PAYDOLLAR_BRAND_NAME");
        display.customer_service_number = get("PAYDOLLAR_CUSTOMER_SERVICE_NUMBER");
        display.req_confirm_shipping = get("PAYDOLLAR_REQUIRE_SHIPPING_CONFIRMATION")
            .map(|value| parse_flag("PAYDOLLAR_REQUIRE_SHIPPING_CONFIRMATION", &value))
            .transpose()?;
        display.allow_note = get("PAYDOLLAR_ALLOW_NOTE")
            .map(|value| parse_flag("PAYDOLLAR_ALLOW_NOTE", &value))
            .transpose()?;
        display.callback_timeout = get("PAYDOLLAR_CALLBACK_TIMEOUT")
            .map(|value| {
                value.trim().parse::<u32>().map_err(|e| {
                    PaymentError::Configuration(format!(
                        "PAYDOLLAR_CALLBACK_TIMEOUT must be a whole number of seconds: {e}"
                    ))
                })
            })
            .transpose()?;

        Ok(config)
    }

    /// The configured payment action, rejected if the gateway does not know it.
    pub fn payment_action(&self) -> Result<PaymentAction> {
        self.payment_action.parse()
    }

    pub fn callback_scheme(&self) -> &'static str {
        if self.callback_https { "https" } else { "http" }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(PaymentError::Configuration(format!(
            "{key} must be a boolean, got '{other}'"
        ))),
    }
}
