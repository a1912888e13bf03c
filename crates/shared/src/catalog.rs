//! Product catalog
//!
//! Products sold through Stripe checkout. Price IDs must match the ones
//! configured in the Stripe dashboard.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutMode {
    Payment,
    Subscription,
}

impl CheckoutMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutMode::Payment => "payment",
            CheckoutMode::Subscription => "subscription",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingInterval {
    Month,
    Year,
}

#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: &'static str,
    pub price_id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub mode: CheckoutMode,
    /// Price in major currency units
    pub price: f64,
    pub currency: &'static str,
    pub interval: Option<BillingInterval>,
}

pub const PRODUCTS: &[Product] = &[Product {
    id: "prod_ScRbJ6ZECew9FE",
    price_id: "price_1RhCiGJteaQNzOZDgzrK6ws0",
    name: "Franklin",
    description: "Transform your identity goals into daily actions. Franklin helps you break down \
                  12-week outcomes into daily micro-steps, with morning planning and evening \
                  reflection to keep you on track.",
    mode: CheckoutMode::Subscription,
    price: 9.99,
    currency: "usd",
    interval: Some(BillingInterval::Month),
}];

pub fn product_by_id(id: &str) -> Option<&'static Product> {
    PRODUCTS.iter().find(|p| p.id == id)
}

pub fn product_by_price_id(price_id: &str) -> Option<&'static Product> {
    PRODUCTS.iter().find(|p| p.price_id == price_id)
}
