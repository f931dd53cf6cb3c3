//! Checkout orchestration against the payment processor.
//!
//! The client submits its cart snapshot; the server recomputes the amount,
//! creates a payment intent, and hands back the client secret for
//! browser-side confirmation. The processor base URL comes from config so
//! tests can point it at a local mock.

use axum::{extract::State, Extension, Json};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_core::cart::{totals, CartItem, CartTotals, PricingRules};

use crate::middleware::RequestId;

use super::orders::validate_cart_items;
use super::{ApiError, ApiResponse, AppState, ResponseMeta};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct PaymentIntentRequest {
    #[serde(default)]
    pub items: Vec<CartItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct PaymentIntentData {
    pub client_secret: String,
    /// Total charged, in minor units (cents), as sent to the processor.
    pub amount: i64,
    pub totals: CartTotals,
}

#[derive(Debug, Serialize)]
pub(super) struct CheckoutConfigData {
    pub publishable_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripePaymentIntent {
    id: String,
    client_secret: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/checkout/config — the publishable key for Stripe Elements.
pub(super) async fn checkout_config(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<CheckoutConfigData>> {
    Json(ApiResponse {
        data: CheckoutConfigData {
            publishable_key: state.config.stripe_publishable_key.clone(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

/// POST /api/checkout/payment-intent — create an intent for the cart total.
pub(super) async fn create_payment_intent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<PaymentIntentRequest>,
) -> Result<Json<ApiResponse<PaymentIntentData>>, ApiError> {
    let rid = &req_id.0;
    validate_cart_items(rid, &body.items)?;

    let Some(secret_key) = state.config.stripe_secret_key.as_deref() else {
        tracing::error!("payment intent requested but STRIPE_SECRET_KEY is unset");
        return Err(ApiError::new(
            rid,
            "internal_error",
            "payment processor is not configured",
        ));
    };

    let rules = PricingRules {
        flat_shipping: state.config.flat_shipping,
        free_shipping_over: state.config.free_shipping_over,
        tax_rate: state.config.tax_rate,
    };
    let amounts = totals(&body.items, &rules);
    let amount_minor = (amounts.total * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .ok_or_else(|| {
            ApiError::new(rid, "validation_error", "cart total is out of range")
        })?;
    if amount_minor <= 0 {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "cart total must be greater than zero",
        ));
    }

    let intent = request_payment_intent(&state, secret_key, amount_minor)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "payment intent creation failed");
            ApiError::new(rid, "internal_error", "payment processor request failed")
        })?;
    tracing::info!(intent_id = %intent.id, amount_minor, "payment intent created");

    Ok(Json(ApiResponse {
        data: PaymentIntentData {
            client_secret: intent.client_secret,
            amount: amount_minor,
            totals: amounts,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

async fn request_payment_intent(
    state: &AppState,
    secret_key: &str,
    amount_minor: i64,
) -> anyhow::Result<StripePaymentIntent> {
    let url = format!("{}/v1/payment_intents", state.config.stripe_api_base);
    let params = [
        ("amount", amount_minor.to_string()),
        ("currency", "usd".to_string()),
        ("automatic_payment_methods[enabled]", "true".to_string()),
    ];

    let response = state
        .http
        .post(url)
        .bearer_auth(secret_key)
        .form(&params)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("processor returned {status}: {body}");
    }

    Ok(response.json::<StripePaymentIntent>().await?)
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::test_support::{request, send, test_app_with_config, test_config};


    #[sqlx::test(migrations = "../../migrations")]
    async fn payment_intent_charges_the_recomputed_total(pool: sqlx::PgPool) {
        let stripe = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            // 2 x 14.50 items + 10.00 shipping = 39.00 -> 3900 minor units.
            .and(body_string_contains("amount=3900"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "pi_test_123",
                "client_secret": "pi_test_123_secret_abc"
            })))
            .expect(1)
            .mount(&stripe)
            .await;

        let mut config = test_config();
        config.stripe_secret_key = Some("sk_test_xyz".to_string());
        config.stripe_api_base = stripe.uri();

        let cart = json!({
            "items": [
                { "product_id": 1, "name": "Mug", "price": "14.50", "quantity": 2 }
            ]
        });
        let (status, body) = send(
            test_app_with_config(pool, config),
            request("POST", "/api/checkout/payment-intent", None, Some(cart)),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["client_secret"], json!("pi_test_123_secret_abc"));
        assert_eq!(body["data"]["amount"], json!(3900));
        assert_eq!(body["data"]["totals"]["total"], json!("39.00"));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn payment_intent_rejects_empty_cart(pool: sqlx::PgPool) {
        let (status, _) = send(
            test_app_with_config(pool, test_config()),
            request(
                "POST",
                "/api/checkout/payment-intent",
                None,
                Some(json!({ "items": [] })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn payment_intent_without_processor_config_is_a_server_error(pool: sqlx::PgPool) {
        let cart = json!({
            "items": [
                { "product_id": 1, "name": "Mug", "price": "14.50", "quantity": 1 }
            ]
        });
        let (status, body) = send(
            test_app_with_config(pool, test_config()),
            request("POST", "/api/checkout/payment-intent", None, Some(cart)),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        // The secret-key situation is not leaked to the client.
        assert_eq!(
            body["error"]["message"],
            json!("payment processor is not configured")
        );
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn processor_failure_maps_to_internal_error(pool: sqlx::PgPool) {
        let stripe = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/payment_intents"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": { "message": "card declined" }
            })))
            .mount(&stripe)
            .await;

        let mut config = test_config();
        config.stripe_secret_key = Some("sk_test_xyz".to_string());
        config.stripe_api_base = stripe.uri();

        let cart = json!({
            "items": [
                { "product_id": 1, "name": "Mug", "price": "14.50", "quantity": 1 }
            ]
        });
        let (status, body) = send(
            test_app_with_config(pool, config),
            request("POST", "/api/checkout/payment-intent", None, Some(cart)),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body["error"]["message"],
            json!("payment processor request failed")
        );
    }
}
