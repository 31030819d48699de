//! Verified Stripe event envelope.

use serde::Deserialize;
use serde_json::value::RawValue;

/// A Stripe event whose signature has been checked.
///
/// Only the fields the relay routes on are decoded. The event-specific object
/// (`data.object`) is kept as raw JSON bytes and decoded later per event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Namespaced event type, e.g. `payment_intent.succeeded`
    pub event_type: String,
    /// `false` for events from the Stripe test environment
    pub live_mode: bool,
    /// Raw JSON of `data.object`
    pub raw_data: Vec<u8>,
}

#[derive(Deserialize)]
struct Envelope<'a> {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    livemode: bool,
    #[serde(borrow)]
    data: EnvelopeData<'a>,
}

#[derive(Deserialize)]
struct EnvelopeData<'a> {
    #[serde(borrow)]
    object: &'a RawValue,
}

impl InboundEvent {
    /// Decode the event envelope from a webhook body.
    pub fn from_json(payload: &[u8]) -> Result<Self, serde_json::Error> {
        let envelope: Envelope<'_> = serde_json::from_slice(payload)?;

        Ok(Self {
            event_type: envelope.event_type,
            live_mode: envelope.livemode,
            raw_data: envelope.data.object.get().as_bytes().to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_keeps_raw_object() {
        let payload = br#"{
            "id": "evt_1",
            "object": "event",
            "type": "payment_intent.succeeded",
            "livemode": true,
            "data": {"object": {"id": "pi_1", "amount": 1050, "currency": "usd"}}
        }"#;

        let event = InboundEvent::from_json(payload).unwrap();

        assert_eq!(event.event_type, "payment_intent.succeeded");
        assert!(event.live_mode);

        let object: serde_json::Value = serde_json::from_slice(&event.raw_data).unwrap();
        assert_eq!(object["id"], "pi_1");
        assert_eq!(object["amount"], 1050);
    }

    #[test]
    fn test_from_json_missing_data() {
        let payload = br#"{"type": "payment_intent.succeeded", "livemode": false}"#;
        assert!(InboundEvent::from_json(payload).is_err());
    }

    #[test]
    fn test_from_json_not_json() {
        assert!(InboundEvent::from_json(b"definitely not json").is_err());
    }
}
