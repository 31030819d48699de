//! Maps Stripe events to notifications.
//!
//! Every supported event type is one entry in [`HANDLERS`]. The builder never
//! fails: an unknown type gets a generic notification and an object that does
//! not decode gets a placeholder body under the type's usual title.

use tracing::{info, warn};

use super::money::Money;
use super::objects::{Dispute, EarlyFraudWarning, PaymentIntent, Subscription};

/// Base of every click-through link.
pub const DASHBOARD_URL: &str = "https://dashboard.stripe.com";

pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";
pub const EARLY_FRAUD_WARNING_CREATED: &str = "radar.early_fraud_warning.created";
pub const CHARGE_DISPUTE_CREATED: &str = "charge.dispute.created";
pub const SUBSCRIPTION_CREATED: &str = "customer.subscription.created";
pub const SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";

/// Title used for event types without a handler.
pub const UNKNOWN_EVENT_TITLE: &str = "❓ Unknown Stripe Event";

/// A push notification ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub click_url: Option<String>,
}

/// Body and link produced from a successfully decoded object.
struct Rendered {
    body: String,
    click_url: Option<String>,
}

type RenderFn = fn(&[u8]) -> Result<Rendered, serde_json::Error>;

/// How one event type becomes a notification.
pub struct EventHandler {
    pub event_type: &'static str,
    pub title: &'static str,
    /// Used in the placeholder body when the object cannot be decoded
    pub object_name: &'static str,
    render: RenderFn,
}

pub const HANDLERS: &[EventHandler] = &[
    EventHandler {
        event_type: PAYMENT_INTENT_SUCCEEDED,
        title: "💰 Payment Succeeded",
        object_name: "Payment intent",
        render: render_payment_succeeded,
    },
    EventHandler {
        event_type: EARLY_FRAUD_WARNING_CREATED,
        title: "⚠️ Early Fraud Warning",
        object_name: "Radar warning",
        render: render_early_fraud_warning,
    },
    EventHandler {
        event_type: CHARGE_DISPUTE_CREATED,
        title: "💀 New Dispute",
        object_name: "Dispute",
        render: render_dispute,
    },
    EventHandler {
        event_type: SUBSCRIPTION_CREATED,
        title: "🎉 New Subscription",
        object_name: "Subscription",
        render: render_subscription_created,
    },
    EventHandler {
        event_type: SUBSCRIPTION_DELETED,
        title: "😥 Subscription canceled",
        object_name: "Subscription",
        render: render_subscription_deleted,
    },
];

/// Look up the handler registered for an exact event type.
pub fn handler_for(event_type: &str) -> Option<&'static EventHandler> {
    HANDLERS.iter().find(|h| h.event_type == event_type)
}

/// Build the notification for an event.
pub fn build_notification(event_type: &str, raw_data: &[u8]) -> Notification {
    let Some(handler) = handler_for(event_type) else {
        info!(event_type = %event_type, "notification_unknown_event_type");
        return Notification {
            title: UNKNOWN_EVENT_TITLE.to_string(),
            body: format!("Type: `{}`", event_type),
            click_url: None,
        };
    };

    match (handler.render)(raw_data) {
        Ok(rendered) => Notification {
            title: handler.title.to_string(),
            body: rendered.body,
            click_url: rendered.click_url,
        },
        Err(e) => {
            warn!(
                event_type = %event_type,
                parse_target = handler.object_name,
                error = %e,
                "notification_object_parse_failed"
            );
            Notification {
                title: handler.title.to_string(),
                body: format!("{} could not be parsed", handler.object_name),
                click_url: None,
            }
        }
    }
}

fn dashboard_url(section: &str, id: &str) -> String {
    format!("{}/{}/{}", DASHBOARD_URL, section, id)
}

fn render_payment_succeeded(raw: &[u8]) -> Result<Rendered, serde_json::Error> {
    let intent: PaymentIntent = serde_json::from_slice(raw)?;

    Ok(Rendered {
        body: format!("Received {}", Money::new(&intent.currency, intent.amount)),
        click_url: Some(dashboard_url("payments", &intent.id)),
    })
}

fn render_early_fraud_warning(raw: &[u8]) -> Result<Rendered, serde_json::Error> {
    let warning: EarlyFraudWarning = serde_json::from_slice(raw)?;

    let status = if warning.actionable {
        "actionable"
    } else {
        "inactionable"
    };

    // The amount is only known when the payment intent was expanded.
    let amount = warning
        .payment_intent
        .as_ref()
        .and_then(|pi| pi.object())
        .map(|pi| Money::new(&pi.currency, pi.amount).to_string())
        .unwrap_or_else(|| "an unknown amount".to_string());

    Ok(Rendered {
        body: format!("For {} ({})", amount, status),
        click_url: Some(dashboard_url("payments", warning.charge.id())),
    })
}

fn render_dispute(raw: &[u8]) -> Result<Rendered, serde_json::Error> {
    let dispute: Dispute = serde_json::from_slice(raw)?;

    Ok(Rendered {
        body: format!("For {}", Money::new(&dispute.currency, dispute.amount)),
        click_url: Some(dashboard_url("payments", dispute.charge.id())),
    })
}

fn render_subscription_created(raw: &[u8]) -> Result<Rendered, serde_json::Error> {
    render_subscription(raw, "For customer")
}

fn render_subscription_deleted(raw: &[u8]) -> Result<Rendered, serde_json::Error> {
    render_subscription(raw, "Canceled for customer")
}

fn render_subscription(raw: &[u8], lead: &str) -> Result<Rendered, serde_json::Error> {
    let sub: Subscription = serde_json::from_slice(raw)?;

    let body = match recurring_amount(&sub) {
        Some(details) => format!("{} `{}` {}", lead, sub.customer.id(), details),
        None => format!("{} `{}`", lead, sub.customer.id()),
    };

    Ok(Rendered {
        body,
        click_url: Some(dashboard_url("subscriptions", &sub.id)),
    })
}

/// `({amount}/{interval})` for the first recurring line item.
fn recurring_amount(sub: &Subscription) -> Option<String> {
    let item = sub.first_item()?;
    let price = item.price.as_ref()?;
    let recurring = price.recurring.as_ref()?;

    let unit_amount = price.unit_amount.unwrap_or(0);
    let quantity = item.quantity.unwrap_or(1);
    let Some(total) = unit_amount.checked_mul(quantity) else {
        warn!(
            subscription_id = %sub.id,
            unit_amount = unit_amount,
            quantity = quantity,
            "subscription_amount_overflow"
        );
        return None;
    };

    Some(format!(
        "({}/{})",
        Money::new(&price.currency, total),
        recurring.interval
    ))
}
