mod common;

use common::{MockTransport, SET_RESPONSE, TOKEN};
use paydollar::application::facade::{CheckoutFacade, CheckoutRequest};
use paydollar::config::GatewayConfig;
use paydollar::domain::ports::RecordStore;
use paydollar::domain::record::Method;
use paydollar::error::PaymentError;
use paydollar::infrastructure::in_memory::InMemoryRecordStore;
use paydollar::interfaces::nvp::ParamValue;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use url::Url;

async fn checkout(request: CheckoutRequest) -> (Url, MockTransport, InMemoryRecordStore) {
    let transport = MockTransport::with_response(SET_RESPONSE);
    let store = InMemoryRecordStore::new();
    let facade = CheckoutFacade::with_site_urls(common::client(&transport, &store));

    let url = facade.checkout_url(&request).await.unwrap();
    (Url::parse(&url).unwrap(), transport, store)
}

fn request_with_shipping_methods() -> CheckoutRequest {
    let mut request = CheckoutRequest::new(common::basket());
    request.shipping_methods = vec![common::free_shipping()];
    request
}

#[tokio::test]
async fn test_redirect_url_carries_token_and_command() {
    let (url, _, _) = checkout(request_with_shipping_methods()).await;

    let query: BTreeMap<String, String> = url.query_pairs().into_owned().collect();
    assert_eq!(query.get("token").map(String::as_str), Some(TOKEN));
    assert_eq!(query.get("cmd").map(String::as_str), Some("_paydollar-checkout"));
    assert_eq!(url.host_str(), Some("www.sandbox.paydollar.com"));
}

#[tokio::test]
async fn test_unset_options_are_omitted_and_defaults_applied() {
    let (_, transport, _) = checkout(request_with_shipping_methods()).await;
    let params = transport.last_params();

    for key in [
        "LOCALECODE",
        "HDRIMG",
        "LANDINGPAGE",
        "REQCONFIRMSHIPPING",
        "PAGESTYLE",
        "SOLUTIONTYPE",
        "BRANDNAME",
        "CUSTOMERSERVICENUMBER",
    ] {
        assert!(!params.contains_key(key), "{key} should not be sent");
    }

    assert_eq!(params.first("CALLBACKTIMEOUT"), Some("3"));
    assert_eq!(params.first("ALLOWNOTE"), Some("1"));
}

#[tokio::test]
async fn test_request_is_signed_and_posted_to_endpoint() {
    let (_, transport, _) = checkout(request_with_shipping_methods()).await;

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, GatewayConfig::default().endpoint);

    let params = transport.last_params();
    assert_eq!(params.first("METHOD"), Some("SetPaydollarCheckout"));
    assert_eq!(params.first("USER"), Some("merchant_api1.example.com"));
    assert_eq!(params.first("PWD"), Some("s3cret"));
    assert_eq!(params.first("VERSION"), Some("88.0"));
    assert_eq!(
        params.first("RETURNURL"),
        Some("https://shop.example.com/checkout/paydollar/success/1/")
    );
    assert_eq!(
        params.first("CANCELURL"),
        Some("https://shop.example.com/checkout/paydollar/fail/1/")
    );
    assert_eq!(
        params.first("CALLBACK"),
        Some("https://shop.example.com/checkout/paydollar/shipping-options/1/")
    );
    assert_eq!(params.first("PAYMENTREQUEST_0_AMT"), Some("200.00"));
    assert_eq!(params.first("PAYMENTREQUEST_0_CURRENCYCODE"), Some("GBP"));
    assert_eq!(params.first("PAYMENTREQUEST_0_PAYMENTACTION"), Some("Sale"));
}

#[tokio::test]
async fn test_extra_params_are_sent_with_flags_as_digits() {
    let mut request = request_with_shipping_methods();
    let extra: BTreeMap<String, ParamValue> = [
        ("CUSTOMERSERVICENUMBER", ParamValue::from("999999999")),
        ("SOLUTIONTYPE", ParamValue::from("Mark")),
        ("LANDINGPAGE", ParamValue::from("Login")),
        ("BRANDNAME", ParamValue::from("My Brand Name")),
        ("PAGESTYLE", ParamValue::from("eee")),
        ("HDRIMG", ParamValue::from("http://image.jpg")),
        ("LOCALECODE", ParamValue::from("GB")),
        ("REQCONFIRMSHIPPING", ParamValue::from(true)),
        ("ALLOWNOTE", ParamValue::from(false)),
        ("CALLBACKTIMEOUT", ParamValue::from(2u32)),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect();
    request.options.extra = extra.clone();

    let (url, transport, _) = checkout(request).await;
    assert!(url.query_pairs().any(|(key, _)| key == "token"));

    let params = transport.last_params();
    for (key, value) in &extra {
        assert_eq!(params.first(key), Some(value.encode().as_str()), "{key}");
    }
    assert_eq!(params.first("REQCONFIRMSHIPPING"), Some("1"));
    assert_eq!(params.first("ALLOWNOTE"), Some("0"));
}

#[tokio::test]
async fn test_caller_override_of_amount_wins() {
    let mut request = request_with_shipping_methods();
    request.options.extra =
        BTreeMap::from([("PAYMENTREQUEST_0_AMT".to_string(), ParamValue::from(dec!(150)))]);

    let (_, transport, store) = checkout(request).await;
    assert_eq!(transport.last_params().first("PAYMENTREQUEST_0_AMT"), Some("150.00"));

    let record = store.find(TOKEN, Method::Register).await.unwrap().unwrap();
    assert_eq!(record.amount(), Some(dec!(150.00)));
}

#[tokio::test]
async fn test_register_record_is_saved() {
    let (_, _, store) = checkout(request_with_shipping_methods()).await;

    let record = store.find(TOKEN, Method::Register).await.unwrap().unwrap();
    assert_eq!(record.token(), TOKEN);
    assert_eq!(record.method(), Method::Register);
    assert_eq!(record.ack(), "Success");
    assert_eq!(record.correlation_id(), Some("50a8d895e928f"));
    assert_eq!(record.amount(), Some(dec!(200.00)));
    assert_eq!(record.currency(), Some("GBP"));
    assert!(record.raw_request().contains("PWD=XXXXXX"));
    assert!(!record.raw_request().contains("s3cret"));
    assert_eq!(record.raw_response(), SET_RESPONSE);
}

#[tokio::test]
async fn test_customer_details_prefill_the_form() {
    let json = r#"{
        "basket": {"id": 9, "total_incl_tax": "50.00"},
        "customer": {
            "email": "david@example.com",
            "billing_address": {"first_name": "David", "line1": "1 Main Terrace", "country_code": "GB"}
        }
    }"#;
    let request: CheckoutRequest = serde_json::from_str(json).unwrap();

    let (_, transport, _) = checkout(request).await;
    let params = transport.last_params();
    assert_eq!(params.first("EMAIL"), Some("david@example.com"));
    assert_eq!(params.first("PAYMENTREQUEST_0_SHIPTOSTREET"), Some("1 Main Terrace"));
    assert!(!params.contains_key("ADDROVERRIDE"));
    assert!(!params.contains_key("CALLBACK"));
}

#[tokio::test]
async fn test_unsupported_action_fails_before_any_call() {
    let transport = MockTransport::with_response(SET_RESPONSE);
    let store = InMemoryRecordStore::new();
    let config = GatewayConfig {
        payment_action: "Refund".into(),
        ..common::config()
    };
    let facade = CheckoutFacade::with_site_urls(common::client_with(config, &transport, &store));

    let err = facade
        .checkout_url(&request_with_shipping_methods())
        .await
        .unwrap_err();

    assert!(matches!(err, PaymentError::Configuration(_)));
    assert!(err.to_string().contains("'Refund' is not a valid payment action"));
    assert!(transport.calls().is_empty());
    assert!(store.history(TOKEN).await.unwrap().is_empty());
}
