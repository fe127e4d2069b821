//! Wire types for the hosted-checkout provider.

use serde::Deserialize;

/// One line item of a checkout session request.
///
/// Amounts are in the currency's minor unit (cents), as the provider
/// requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLineItem {
    pub name: String,
    pub description: String,
    pub unit_amount: i64,
    pub currency: &'static str,
    pub quantity: u32,
}

/// A request to create a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub line_items: Vec<SessionLineItem>,
    pub success_url: String,
    pub cancel_url: String,
}

impl CheckoutSessionRequest {
    /// Flatten the request into the provider's indexed form encoding:
    /// `line_items[0][price_data][unit_amount]=1999&...`
    #[must_use]
    pub fn form_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
        ];

        for (i, item) in self.line_items.iter().enumerate() {
            params.push((
                format!("line_items[{i}][quantity]"),
                item.quantity.to_string(),
            ));
            params.push((
                format!("line_items[{i}][price_data][currency]"),
                item.currency.to_string(),
            ));
            params.push((
                format!("line_items[{i}][price_data][unit_amount]"),
                item.unit_amount.to_string(),
            ));
            params.push((
                format!("line_items[{i}][price_data][product_data][name]"),
                item.name.clone(),
            ));
            params.push((
                format!("line_items[{i}][price_data][product_data][description]"),
                item.description.clone(),
            ));
        }

        params
    }
}

/// A created checkout session, as returned by the provider.
///
/// Transient: handed to the rendering layer for the shopper's redirect
/// and then discarded. Never persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSession {
    /// Opaque session identifier.
    pub id: String,
    /// Hosted payment page URL.
    pub url: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            line_items: vec![
                SessionLineItem {
                    name: "Marigold Seeds".to_string(),
                    description: "A packet of seeds".to_string(),
                    unit_amount: 1000,
                    currency: "usd",
                    quantity: 2,
                },
                SessionLineItem {
                    name: "Watering Can".to_string(),
                    description: "Two litres".to_string(),
                    unit_amount: 500,
                    currency: "usd",
                    quantity: 1,
                },
            ],
            success_url: "https://shop.example.com/checkout/success".to_string(),
            cancel_url: "https://shop.example.com/checkout/cancel".to_string(),
        }
    }

    #[test]
    fn test_form_params_carries_mode_and_urls() {
        let params = sample_request().form_params();

        assert!(params.contains(&("mode".to_string(), "payment".to_string())));
        assert!(params.contains(&(
            "success_url".to_string(),
            "https://shop.example.com/checkout/success".to_string()
        )));
        assert!(params.contains(&(
            "cancel_url".to_string(),
            "https://shop.example.com/checkout/cancel".to_string()
        )));
    }

    #[test]
    fn test_form_params_indexes_line_items() {
        let params = sample_request().form_params();

        assert!(params.contains(&("line_items[0][quantity]".to_string(), "2".to_string())));
        assert!(params.contains(&(
            "line_items[0][price_data][unit_amount]".to_string(),
            "1000".to_string()
        )));
        assert!(params.contains(&(
            "line_items[1][price_data][product_data][name]".to_string(),
            "Watering Can".to_string()
        )));
        assert!(params.contains(&(
            "line_items[1][price_data][currency]".to_string(),
            "usd".to_string()
        )));
    }

    #[test]
    fn test_session_response_parses() {
        let session: ProviderSession = serde_json::from_str(
            r#"{"id": "cs_test_123", "url": "https://pay.example.com/cs_test_123", "object": "checkout.session"}"#,
        )
        .unwrap();

        assert_eq!(session.id, "cs_test_123");
        assert_eq!(session.url, "https://pay.example.com/cs_test_123");
    }
}
