use crate::config::{DEFAULT_ALLOW_NOTE, DEFAULT_CALLBACK_TIMEOUT, DisplayOptions, GatewayConfig};
use crate::domain::basket::{Address, Basket, ShippingMethod};
use crate::domain::ports::{GatewayTransportBox, RecordStore, RecordStoreBox};
use crate::domain::record::{
    Context, Exchange, Method, PaymentAction, TransactionRecord, is_success_ack,
};
use crate::error::{GatewayError, PaymentError, Result};
use crate::interfaces::nvp::{self, ParamValue, Params};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use url::Url;

/// `cmd` query value of the hosted checkout redirect.
pub const CHECKOUT_COMMAND: &str = "_paydollar-checkout";

const DESCRIPTION_WORDS: usize = 12;

/// Callback URLs the processor sends the customer back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackUrls {
    pub success: String,
    pub fail: String,
    /// Where the processor asks for shipping options. Only used when the
    /// customer still has to pick a shipping method.
    pub update: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShippingDetails {
    /// Methods the customer may choose from on the hosted page.
    pub methods: Vec<ShippingMethod>,
    /// A method already chosen on our side.
    pub selected: Option<ShippingMethod>,
    /// A confirmed address; the processor is told not to let the customer change it.
    pub address: Option<Address>,
    /// An address used only to prefill the hosted form.
    pub prefill_address: Option<Address>,
}

/// Per-call register options. Anything unset falls back to configuration,
/// and anything still unset is left for the gateway to default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegisterOptions {
    pub currency: Option<String>,
    pub email: Option<String>,
    pub display: DisplayOptions,
    /// Raw gateway parameters merged over everything else.
    pub extra: BTreeMap<String, ParamValue>,
}

/// Client for the processor's token-based checkout API.
///
/// Every call is a single POST to the configured endpoint. Responses are
/// decoded into a [`TransactionRecord`] which is saved before it is returned,
/// including for calls the gateway declined.
pub struct GatewayClient {
    config: GatewayConfig,
    transport: GatewayTransportBox,
    store: RecordStoreBox,
}

impl GatewayClient {
    pub fn new(config: GatewayConfig, transport: GatewayTransportBox, store: RecordStoreBox) -> Self {
        Self {
            config,
            transport,
            store,
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }

    /// Registers a checkout and returns the hosted-checkout URL for it.
    pub async fn register(
        &self,
        basket: &Basket,
        shipping: &ShippingDetails,
        urls: &CallbackUrls,
        action: PaymentAction,
        options: &RegisterOptions,
    ) -> Result<String> {
        let mut redirect = Url::parse(&self.config.checkout_url).map_err(|e| {
            PaymentError::Configuration(format!(
                "invalid checkout URL '{}': {e}",
                self.config.checkout_url
            ))
        })?;
        let params = register_params(&self.config, basket, shipping, urls, action, options);
        let record = self.call(Method::Register, params, None).await?;

        redirect
            .query_pairs_mut()
            .append_pair("cmd", CHECKOUT_COMMAND)
            .append_pair("token", record.token());
        Ok(redirect.into())
    }

    /// Reads back the full details of a registered checkout.
    pub async fn fetch(&self, token: &str) -> Result<TransactionRecord> {
        let mut params = Params::new();
        params.set("TOKEN", token);
        self.call(Method::Fetch, params, None).await
    }

    /// Completes the payment the customer approved on the hosted page.
    pub async fn confirm(
        &self,
        payer_id: &str,
        token: &str,
        amount: Decimal,
        currency: &str,
        action: PaymentAction,
    ) -> Result<TransactionRecord> {
        let mut params = Params::new();
        params
            .set("TOKEN", token)
            .set("PAYERID", payer_id)
            .set("PAYMENTREQUEST_0_AMT", amount)
            .set("PAYMENTREQUEST_0_CURRENCYCODE", currency)
            .set("PAYMENTREQUEST_0_PAYMENTACTION", action.as_str());
        self.call(Method::Confirm, params, None).await
    }

    /// Captures the full amount of a confirmed authorization.
    pub async fn capture(&self, token: &str, note: Option<&str>) -> Result<TransactionRecord> {
        let authorization = self.authorization(token).await?;
        let transaction_id = authorization
            .transaction_id()
            .ok_or_else(|| PaymentError::decode("PAYMENTINFO_0_TRANSACTIONID", "field is missing"))?;
        let amount = authorization
            .amount()
            .ok_or_else(|| PaymentError::decode("PAYMENTINFO_0_AMT", "field is missing"))?;
        let currency = authorization
            .currency()
            .ok_or_else(|| PaymentError::decode("PAYMENTINFO_0_CURRENCYCODE", "field is missing"))?;

        let mut params = Params::new();
        params
            .set("AUTHORIZATIONID", transaction_id)
            .set("AMT", amount)
            .set("CURRENCYCODE", currency)
            .set("COMPLETETYPE", "Complete")
            .set_opt("NOTE", note);
        self.call(Method::Capture, params, Some(token)).await
    }

    /// Cancels a confirmed authorization without charging it.
    pub async fn void(&self, token: &str, note: Option<&str>) -> Result<TransactionRecord> {
        let authorization = self.authorization(token).await?;
        let transaction_id = authorization
            .transaction_id()
            .ok_or_else(|| PaymentError::decode("PAYMENTINFO_0_TRANSACTIONID", "field is missing"))?;

        let mut params = Params::new();
        params
            .set("AUTHORIZATIONID", transaction_id)
            .set_opt("NOTE", note);
        self.call(Method::Void, params, Some(token)).await
    }

    /// The latest successful confirmation for `token`. Declined retries
    /// stored after it do not hide it.
    async fn authorization(&self, token: &str) -> Result<TransactionRecord> {
        self.store
            .history(token)
            .await?
            .into_iter()
            .rev()
            .find(|record| record.method() == Method::Confirm && record.is_successful())
            .ok_or_else(|| PaymentError::Lookup {
                token: token.to_string(),
                method: Method::Confirm,
            })
    }

    fn base_params(&self, method: Method) -> Params {
        let credentials = &self.config.credentials;
        let mut params = Params::new();
        params
            .set("METHOD", method.api_name())
            .set("VERSION", self.config.api_version.as_str())
            .set("USER", credentials.username.as_str())
            .set("PWD", credentials.password.as_str())
            .set("SIGNATURE", credentials.signature.as_str());
        params
    }

    async fn call(
        &self,
        method: Method,
        params: Params,
        token: Option<&str>,
    ) -> Result<TransactionRecord> {
        let mut request = self.base_params(method);
        request.extend(params);
        let token = token
            .or_else(|| request.get("TOKEN"))
            .map(str::to_string);

        debug!(method = %method, request = %request.masked(), "calling gateway");
        let started = Instant::now();
        let response = self
            .transport
            .post(&self.config.endpoint, request.encode())
            .await?;
        let response_time = started.elapsed();

        if response.status != 200 {
            warn!(method = %method, status = response.status, "gateway returned an error status");
            return Err(GatewayError::Status {
                status: response.status,
            }
            .into());
        }

        let context = nvp::decode(&response.body)?;
        // A declined register carries no token, so there is nothing to key a record by.
        if token.is_none()
            && !context.contains_key("TOKEN")
            && let Some(ack) = context.first("ACK")
            && !is_success_ack(ack)
        {
            let declined = declined_without_record(&context);
            error!(method = %method, error = %declined, "gateway declined the call");
            return Err(declined.into());
        }

        let record = TransactionRecord::from_exchange(Exchange {
            method,
            token,
            raw_request: request.masked(),
            request: request.into_map(),
            raw_response: response.body,
            context,
            response_time,
        })?;
        self.store.save(record.clone()).await?;

        if !record.is_successful() {
            let declined = record.declined();
            error!(
                method = %method,
                token = record.token(),
                correlation_id = record.correlation_id().unwrap_or_default(),
                error = %declined,
                "gateway declined the call"
            );
            return Err(declined.into());
        }

        info!(
            method = %method,
            token = record.token(),
            ack = record.ack(),
            correlation_id = record.correlation_id().unwrap_or_default(),
            elapsed_ms = response_time.as_millis() as u64,
            "gateway call completed"
        );
        Ok(record)
    }
}

fn declined_without_record(context: &Context) -> GatewayError {
    GatewayError::Declined {
        code: context.first("L_ERRORCODE0").unwrap_or_default().to_string(),
        message: context
            .first_of(&["L_LONGMESSAGE0", "L_SHORTMESSAGE0"])
            .map(|(_, message)| message)
            .unwrap_or_default()
            .to_string(),
        correlation_id: context.first("CORRELATIONID").map(str::to_string),
    }
}

/// Parameters for registering a checkout, credentials excluded.
pub fn register_params(
    config: &GatewayConfig,
    basket: &Basket,
    shipping: &ShippingDetails,
    urls: &CallbackUrls,
    action: PaymentAction,
    options: &RegisterOptions,
) -> Params {
    let currency = options.currency.as_deref().unwrap_or(&config.currency);
    let mut params = Params::new();
    params
        .set("PAYMENTREQUEST_0_CURRENCYCODE", currency)
        .set("PAYMENTREQUEST_0_PAYMENTACTION", action.as_str())
        .set("RETURNURL", urls.success.as_str())
        .set("CANCELURL", urls.fail.as_str());

    let mut index = 0;
    for line in &basket.lines {
        params
            .set(format!("L_PAYMENTREQUEST_0_NAME{index}"), line.title.as_str())
            .set_non_empty(
                format!("L_PAYMENTREQUEST_0_NUMBER{index}"),
                line.upc.as_deref().unwrap_or_default(),
            )
            .set_non_empty(
                format!("L_PAYMENTREQUEST_0_DESC{index}"),
                &truncate_words(line.description.as_deref().unwrap_or_default(), DESCRIPTION_WORDS),
            )
            .set(format!("L_PAYMENTREQUEST_0_AMT{index}"), line.unit_price_incl_tax)
            .set(format!("L_PAYMENTREQUEST_0_QTY{index}"), line.quantity);
        index += 1;
    }
    // Discounts go over the wire as extra lines with a negative price.
    for discount in &basket.discounts {
        let name = format!("Special Offer: {}", discount.name);
        params
            .set(format!("L_PAYMENTREQUEST_0_DESC{index}"), truncate_words(&name, DESCRIPTION_WORDS))
            .set(format!("L_PAYMENTREQUEST_0_NAME{index}"), name)
            .set(format!("L_PAYMENTREQUEST_0_AMT{index}"), -discount.amount)
            .set(format!("L_PAYMENTREQUEST_0_QTY{index}"), 1u32);
        index += 1;
    }
    params
        .set("PAYMENTREQUEST_0_ITEMAMT", basket.total_incl_tax)
        .set("PAYMENTREQUEST_0_TAXAMT", Decimal::ZERO);

    let mut shipping_charge = Decimal::ZERO;
    if !basket.shipping_required {
        params.set("NOSHIPPING", true);
    } else if let Some(method) = &shipping.selected {
        shipping_charge = method.charge_incl_tax;
        params.set("PAYMENTREQUEST_0_SHIPPINGAMT", shipping_charge);
    } else if let (Some(update_url), Some(default_method)) =
        (&urls.update, shipping.methods.first())
    {
        let mut max_charge = Decimal::ZERO;
        params.set("CALLBACK", update_url.as_str());
        for (i, method) in shipping.methods.iter().enumerate() {
            params
                .set(format!("L_SHIPPINGOPTIONNAME{i}"), method.name.as_str())
                .set(format!("L_SHIPPINGOPTIONAMOUNT{i}"), method.charge_incl_tax)
                .set(
                    format!("L_SHIPPINGOPTIONISDEFAULT{i}"),
                    if i == 0 { "true" } else { "false" },
                );
            max_charge = max_charge.max(method.charge_incl_tax);
        }
        shipping_charge = default_method.charge_incl_tax;
        params
            .set("PAYMENTREQUEST_0_SHIPPINGAMT", shipping_charge)
            .set("MAXAMT", basket.total_incl_tax + max_charge);
    }
    params.set("PAYMENTREQUEST_0_AMT", basket.total_incl_tax + shipping_charge);

    if basket.shipping_required {
        if let Some(address) = &shipping.address {
            set_address(&mut params, address);
            params.set("ADDROVERRIDE", true);
        } else if let Some(address) = &shipping.prefill_address {
            set_address(&mut params, address);
        }
    }
    params.set_opt("EMAIL", options.email.as_deref());

    let display = options.display.clone().or(&config.display);
    params
        .set_opt("LOCALECODE", display.locale_code)
        .set_opt("HDRIMG", display.header_image)
        .set_opt("LANDINGPAGE", display.landing_page)
        .set_opt("REQCONFIRMSHIPPING", display.req_confirm_shipping)
        .set_opt("PAGESTYLE", display.page_style)
        .set_opt("SOLUTIONTYPE", display.solution_type)
        .set_opt("BRANDNAME", display.brand_name)
        .set_opt("CUSTOMERSERVICENUMBER", display.customer_service_number)
        .set(
            "CALLBACKTIMEOUT",
            display.callback_timeout.unwrap_or(DEFAULT_CALLBACK_TIMEOUT),
        )
        .set("ALLOWNOTE", display.allow_note.unwrap_or(DEFAULT_ALLOW_NOTE));

    params.merge(&options.extra);
    params
}

fn set_address(params: &mut Params, address: &Address) {
    params
        .set_non_empty("PAYMENTREQUEST_0_SHIPTONAME", &address.name())
        .set_non_empty("PAYMENTREQUEST_0_SHIPTOSTREET", &address.line1)
        .set_non_empty("PAYMENTREQUEST_0_SHIPTOSTREET2", &address.line2)
        .set_non_empty("PAYMENTREQUEST_0_SHIPTOCITY", &address.city)
        .set_non_empty("PAYMENTREQUEST_0_SHIPTOSTATE", &address.state)
        .set_non_empty("PAYMENTREQUEST_0_SHIPTOZIP", &address.postcode)
        .set_non_empty("PAYMENTREQUEST_0_SHIPTOCOUNTRYCODE", &address.country_code)
        .set_non_empty("PAYMENTREQUEST_0_SHIPTOPHONENUM", &address.phone_number);
}

fn truncate_words(text: &str, limit: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit {
        words.join(" ")
    } else {
        format!("{} ...", words[..limit].join(" "))
    }
}
