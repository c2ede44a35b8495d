use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A basket line as seen by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub title: String,
    #[serde(default)]
    pub upc: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub unit_price_incl_tax: Decimal,
    pub quantity: u32,
}

/// An offer or voucher discount applied to the basket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub name: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Basket {
    pub id: u64,
    #[serde(default)]
    pub lines: Vec<Line>,
    #[serde(default)]
    pub discounts: Vec<Discount>,
    /// Total of all lines after discounts, tax included.
    pub total_incl_tax: Decimal,
    #[serde(default = "default_shipping_required")]
    pub shipping_required: bool,
}

fn default_shipping_required() -> bool {
    true
}

/// A postal address. Empty fields are never sent to the gateway.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub first_name: String,
    pub last_name: String,
    pub line1: String,
    pub line2: String,
    pub city: String,
    pub state: String,
    pub postcode: String,
    pub country_code: String,
    pub phone_number: String,
}

impl Address {
    pub fn name(&self) -> String {
        [self.first_name.trim(), self.last_name.trim()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingMethod {
    pub name: String,
    pub charge_incl_tax: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default)]
    pub email: Option<String>,
    /// Default billing address, used to prefill the hosted checkout form.
    #[serde(default)]
    pub billing_address: Option<Address>,
}
