use super::gateway::{CallbackUrls, GatewayClient, RegisterOptions, ShippingDetails};
use crate::domain::basket::{Address, Basket, Customer, ShippingMethod};
use crate::domain::ports::CallbackUrlBuilder;
use crate::domain::record::TransactionRecord;
use crate::error::Result;
use crate::infrastructure::site::SiteUrls;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Everything the checkout knows when the customer chooses to pay.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub basket: Basket,
    #[serde(default)]
    pub shipping_methods: Vec<ShippingMethod>,
    #[serde(default)]
    pub customer: Option<Customer>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub shipping_method: Option<ShippingMethod>,
    #[serde(skip)]
    pub options: RegisterOptions,
}

impl CheckoutRequest {
    pub fn new(basket: Basket) -> Self {
        Self {
            basket,
            shipping_methods: Vec::new(),
            customer: None,
            shipping_address: None,
            shipping_method: None,
            options: RegisterOptions::default(),
        }
    }
}

/// Checkout-facing entry points.
///
/// Applies the configured payment action and builds callback URLs before
/// handing over to the [`GatewayClient`].
pub struct CheckoutFacade {
    client: GatewayClient,
    urls: Box<dyn CallbackUrlBuilder>,
}

impl CheckoutFacade {
    pub fn new(client: GatewayClient, urls: Box<dyn CallbackUrlBuilder>) -> Self {
        Self { client, urls }
    }

    /// Uses the configured site host and scheme for callbacks.
    pub fn with_site_urls(client: GatewayClient) -> Self {
        let urls = SiteUrls::from_config(client.config());
        Self::new(client, Box::new(urls))
    }

    pub fn client(&self) -> &GatewayClient {
        &self.client
    }

    /// Registers the basket with the gateway and returns the URL to send the
    /// customer to.
    pub async fn checkout_url(&self, request: &CheckoutRequest) -> Result<String> {
        let action = self.client.config().payment_action()?;
        let basket_id = request.basket.id;

        // Shipping options are only offered when there is a choice to make.
        let urls = CallbackUrls {
            success: self.urls.success_url(basket_id),
            fail: self.urls.fail_url(basket_id),
            update: (!request.shipping_methods.is_empty())
                .then(|| self.urls.update_url(basket_id)),
        };
        let shipping = ShippingDetails {
            methods: request.shipping_methods.clone(),
            selected: request.shipping_method.clone(),
            address: request.shipping_address.clone(),
            prefill_address: request
                .customer
                .as_ref()
                .and_then(|customer| customer.billing_address.clone()),
        };
        let mut options = request.options.clone();
        if options.email.is_none() {
            options.email = request
                .customer
                .as_ref()
                .and_then(|customer| customer.email.clone());
        }

        self.client
            .register(&request.basket, &shipping, &urls, action, &options)
            .await
    }

    pub async fn fetch_transaction_details(&self, token: &str) -> Result<TransactionRecord> {
        self.client.fetch(token).await
    }

    /// Confirms the payment with the configured payment action.
    pub async fn confirm_transaction(
        &self,
        payer_id: &str,
        token: &str,
        amount: Decimal,
        currency: &str,
    ) -> Result<TransactionRecord> {
        let action = self.client.config().payment_action()?;
        self.client
            .confirm(payer_id, token, amount, currency, action)
            .await
    }

    pub async fn capture_authorization(
        &self,
        token: &str,
        note: Option<&str>,
    ) -> Result<TransactionRecord> {
        self.client.capture(token, note).await
    }

    pub async fn void_authorization(
        &self,
        token: &str,
        note: Option<&str>,
    ) -> Result<TransactionRecord> {
        self.client.void(token, note).await
    }
}
