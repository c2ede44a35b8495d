#![allow(dead_code)]

use async_trait::async_trait;
use paydollar::application::gateway::GatewayClient;
use paydollar::config::{Credentials, GatewayConfig};
use paydollar::domain::basket::{Basket, ShippingMethod};
use paydollar::domain::ports::{GatewayTransport, HttpResponse};
use paydollar::domain::record::Context;
use paydollar::error::{GatewayError, Result};
use paydollar::infrastructure::in_memory::InMemoryRecordStore;
use paydollar::interfaces::nvp;
use rust_decimal_macros::dec;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const TOKEN: &str = "EC-6469953681606921P";
pub const TRANSACTION_ID: &str = "51963679RW630412N";

pub const SET_RESPONSE: &str = "TOKEN=EC%2d6469953681606921P&TIMESTAMP=2012%2d03%2d26T17%3a19%3a38Z&CORRELATIONID=50a8d895e928f&ACK=Success&VERSION=60%2e0&BUILD=2649250";

pub const GET_RESPONSE: &str = "TOKEN=EC%2d6WY34243AN3588740&CHECKOUTSTATUS=PaymentActionCompleted&TIMESTAMP=2012%2d04%2d19T10%3a07%3a46Z&CORRELATIONID=7e9c5efbda3c0&ACK=Success&VERSION=88%2e0&BUILD=2808426&EMAIL=david%2e_1332854868_per%40gmail%2ecom&PAYERID=7ZTRBDFYYA47W&PAYERSTATUS=verified&FIRSTNAME=David&LASTNAME=Winterbottom&COUNTRYCODE=GB&SHIPTONAME=David%20Winterbottom&SHIPTOSTREET=1%20Main%20Terrace&SHIPTOCITY=Wolverhampton&SHIPTOSTATE=West%20Midlands&SHIPTOZIP=W12%204LQ&SHIPTOCOUNTRYCODE=GB&SHIPTOCOUNTRYNAME=United%20Kingdom&ADDRESSSTATUS=Confirmed&CURRENCYCODE=GBP&AMT=33%2e98&SHIPPINGAMT=0%2e00&HANDLINGAMT=0%2e00&TAXAMT=0%2e00&INSURANCEAMT=0%2e00&SHIPDISCAMT=0%2e00&PAYMENTREQUEST_0_CURRENCYCODE=GBP&PAYMENTREQUEST_0_AMT=33%2e98&PAYMENTREQUEST_0_SHIPPINGAMT=0%2e00&PAYMENTREQUEST_0_HANDLINGAMT=0%2e00&PAYMENTREQUEST_0_TAXAMT=0%2e00&PAYMENTREQUEST_0_INSURANCEAMT=0%2e00&PAYMENTREQUEST_0_SHIPDISCAMT=0%2e00&PAYMENTREQUEST_0_TRANSACTIONID=51963679RW630412N&PAYMENTREQUEST_0_INSURANCEOPTIONOFFERED=false&PAYMENTREQUEST_0_SHIPTONAME=David%20Winterbottom&PAYMENTREQUEST_0_SHIPTOSTREET=1%20Main%20Terrace&PAYMENTREQUEST_0_SHIPTOCITY=Wolverhampton&PAYMENTREQUEST_0_SHIPTOSTATE=West%20Midlands&PAYMENTREQUEST_0_SHIPTOZIP=W12%204LQ&PAYMENTREQUEST_0_SHIPTOCOUNTRYCODE=GB&PAYMENTREQUEST_0_SHIPTOCOUNTRYNAME=United%20Kingdom&PAYMENTREQUESTINFO_0_TRANSACTIONID=51963679RW630412N&PAYMENTREQUESTINFO_0_ERRORCODE=0";

pub const DO_RESPONSE: &str = "TOKEN=EC%2d6469953681606921P&SUCCESSPAGEREDIRECTREQUESTED=false&TIMESTAMP=2012%2d04%2d19T10%3a08%3a12Z&CORRELATIONID=f5a2b2ba7bc4d&ACK=Success&VERSION=88%2e0&BUILD=2808426&INSURANCEOPTIONSELECTED=false&SHIPPINGOPTIONISDEFAULT=false&PAYMENTINFO_0_TRANSACTIONID=51963679RW630412N&PAYMENTINFO_0_TRANSACTIONTYPE=cart&PAYMENTINFO_0_PAYMENTTYPE=instant&PAYMENTINFO_0_AMT=33%2e98&PAYMENTINFO_0_TAXAMT=0%2e00&PAYMENTINFO_0_CURRENCYCODE=GBP&PAYMENTINFO_0_PAYMENTSTATUS=Pending&PAYMENTINFO_0_PENDINGREASON=authorization&PAYMENTINFO_0_REASONCODE=None&PAYMENTINFO_0_ACK=Success";

pub const CAPTURE_RESPONSE: &str = "AUTHORIZATIONID=51963679RW630412N&TIMESTAMP=2012%2d04%2d19T11%3a02%3a05Z&CORRELATIONID=c0ffee12ab34d&ACK=Success&VERSION=88%2e0&BUILD=2808426&TRANSACTIONID=8XJ23456AB123456C&PARENTTRANSACTIONID=51963679RW630412N&TRANSACTIONTYPE=expresscheckout&PAYMENTTYPE=instant&AMT=33%2e98&FEEAMT=1%2e35&TAXAMT=0%2e00&CURRENCYCODE=GBP&PAYMENTSTATUS=Completed&PENDINGREASON=None&REASONCODE=None";

pub const VOID_RESPONSE: &str = "AUTHORIZATIONID=51963679RW630412N&TIMESTAMP=2012%2d04%2d19T11%3a05%3a41Z&CORRELATIONID=d00d5e1f2a3b4&ACK=Success&VERSION=88%2e0&BUILD=2808426";

pub const FAILURE_RESPONSE: &str = "TIMESTAMP=2012%2d04%2d19T11%3a07%3a00Z&CORRELATIONID=bad05e1f2a3b4&ACK=Failure&VERSION=88%2e0&BUILD=2808426&L_ERRORCODE0=10410&L_SHORTMESSAGE0=Invalid%20token&L_LONGMESSAGE0=Invalid%20token%2e&L_SEVERITYCODE0=Error";

/// A transport that replays queued responses and records every request.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<HttpResponse>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(body: &str) -> Self {
        let transport = Self::new();
        transport.respond(200, body);
        transport
    }

    pub fn respond(&self, status: u16, body: &str) {
        self.responses.lock().unwrap().push_back(HttpResponse {
            status,
            body: body.to_string(),
        });
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Parameters of the most recent request.
    pub fn last_params(&self) -> Context {
        let calls = self.calls();
        let (_, body) = calls.last().expect("no request was sent");
        nvp::decode(body).unwrap()
    }
}

#[async_trait]
impl GatewayTransport for MockTransport {
    async fn post(&self, url: &str, body: String) -> Result<HttpResponse> {
        self.calls.lock().unwrap().push((url.to_string(), body));
        let response = self.responses.lock().unwrap().pop_front();
        response.ok_or_else(|| GatewayError::Transport("no response queued".into()).into())
    }
}

pub fn config() -> GatewayConfig {
    GatewayConfig {
        credentials: Credentials {
            username: "merchant_api1.example.com".into(),
            password: "s3cret".into(),
            signature: "An5ns1Kso7MWUdW4ErQKJJJ4qi4-A".into(),
        },
        site_host: "shop.example.com".into(),
        ..Default::default()
    }
}

pub fn client(transport: &MockTransport, store: &InMemoryRecordStore) -> GatewayClient {
    client_with(config(), transport, store)
}

pub fn client_with(
    config: GatewayConfig,
    transport: &MockTransport,
    store: &InMemoryRecordStore,
) -> GatewayClient {
    GatewayClient::new(config, Box::new(transport.clone()), Box::new(store.clone()))
}

pub fn basket() -> Basket {
    Basket {
        id: 1,
        lines: vec![],
        discounts: vec![],
        total_incl_tax: dec!(200),
        shipping_required: true,
    }
}

pub fn free_shipping() -> ShippingMethod {
    ShippingMethod {
        name: "Free shipping".into(),
        charge_incl_tax: dec!(0),
    }
}
