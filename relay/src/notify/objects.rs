//! The parts of Stripe API objects the notifications read.
//!
//! Unknown fields are ignored, so full Stripe payloads decode into these.

use serde::Deserialize;

/// A reference Stripe may send either as a bare id or as the expanded object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Expandable<T> {
    Id(String),
    Object(Box<T>),
}

/// Objects that carry a Stripe id.
pub trait Identified {
    fn id(&self) -> &str;
}

impl<T: Identified> Expandable<T> {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object(object) => object.id(),
        }
    }

    /// The expanded object, if Stripe sent one.
    pub fn object(&self) -> Option<&T> {
        match self {
            Expandable::Id(_) => None,
            Expandable::Object(object) => Some(object),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub amount: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Charge {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    pub id: String,
}

/// `radar.early_fraud_warning`
#[derive(Debug, Clone, Deserialize)]
pub struct EarlyFraudWarning {
    pub actionable: bool,
    pub charge: Expandable<Charge>,
    #[serde(default)]
    pub payment_intent: Option<Expandable<PaymentIntent>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dispute {
    pub amount: i64,
    pub currency: String,
    pub charge: Expandable<Charge>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub customer: Expandable<Customer>,
    #[serde(default)]
    pub items: Option<List<SubscriptionItem>>,
}

impl Subscription {
    /// The first line item, which is the one shown in notifications.
    pub fn first_item(&self) -> Option<&SubscriptionItem> {
        self.items.as_ref().and_then(|items| items.data.first())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct List<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionItem {
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub price: Option<Price>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    pub currency: String,
    #[serde(default)]
    pub unit_amount: Option<i64>,
    #[serde(default)]
    pub recurring: Option<Recurring>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Recurring {
    pub interval: String,
}

impl Identified for PaymentIntent {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Charge {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for Customer {
    fn id(&self) -> &str {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expandable_id_or_object() {
        let bare: Dispute =
            serde_json::from_str(r#"{"amount": 1, "currency": "usd", "charge": "ch_1"}"#).unwrap();
        assert_eq!(bare.charge.id(), "ch_1");
        assert!(bare.charge.object().is_none());

        let expanded: Dispute = serde_json::from_str(
            r#"{"amount": 1, "currency": "usd", "charge": {"id": "ch_2", "object": "charge"}}"#,
        )
        .unwrap();
        assert_eq!(expanded.charge.id(), "ch_2");
        assert!(expanded.charge.object().is_some());
    }

    #[test]
    fn test_subscription_first_item() {
        let sub: Subscription = serde_json::from_str(
            r#"{
                "id": "sub_1",
                "customer": "cus_1",
                "items": {"object": "list", "data": [
                    {"quantity": 2, "price": {"currency": "usd", "unit_amount": 500, "recurring": {"interval": "month"}}},
                    {"quantity": 1, "price": {"currency": "usd", "unit_amount": 100}}
                ]}
            }"#,
        )
        .unwrap();

        let item = sub.first_item().unwrap();
        assert_eq!(item.quantity, Some(2));
        assert_eq!(item.price.as_ref().unwrap().unit_amount, Some(500));
    }

    #[test]
    fn test_subscription_without_items() {
        let sub: Subscription =
            serde_json::from_str(r#"{"id": "sub_1", "customer": "cus_1"}"#).unwrap();
        assert!(sub.first_item().is_none());
    }
}
