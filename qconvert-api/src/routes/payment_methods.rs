/// Payment method endpoints
///
/// # Endpoints
///
/// - `GET /api/billing/payment-methods` - List, newest first
/// - `POST /api/billing/payment-methods` - Add a card or PayPal account
/// - `PUT /api/billing/payment-methods/:id/default` - Make default
/// - `DELETE /api/billing/payment-methods/:id` - Remove
///
/// A user with any payment methods has exactly one default. The first
/// method added becomes default; deleting the default promotes the newest
/// remaining method.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, ValidationErrorDetail},
    extract::{Json, Path},
    response::{created, ok, ok_with_message, ApiResponse},
};
use axum::{extract::State, http::StatusCode, Extension};
use qconvert_shared::{
    auth::{authorization::ensure_owner, identity::Identity},
    models::payment_method::{CreatePaymentMethod, PaymentMethod, PaymentMethodType},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create payment method request
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentMethodRequest {
    #[serde(rename = "type")]
    pub method_type: PaymentMethodType,

    pub last4: Option<String>,

    #[validate(length(max = 50, message = "Card brand must be at most 50 characters"))]
    pub brand: Option<String>,

    #[validate(range(min = 1, max = 12, message = "Expiry month must be between 1 and 12"))]
    pub expiry_month: Option<i16>,

    #[validate(range(min = 2000, max = 2100, message = "Expiry year is invalid"))]
    pub expiry_year: Option<i16>,

    /// PayPal account address
    #[validate(email(message = "Please provide a valid PayPal email"))]
    pub email: Option<String>,

    #[serde(default)]
    pub is_default: bool,
}

impl CreatePaymentMethodRequest {
    /// Field rules plus the per-type requirements
    fn check(&self) -> ApiResult<()> {
        let mut errors = match self.validate() {
            Ok(()) => Vec::new(),
            Err(e) => match ApiError::from(e) {
                ApiError::ValidationError(details) => details,
                other => return Err(other),
            },
        };

        match self.method_type {
            PaymentMethodType::Card => {
                let last4_ok = self
                    .last4
                    .as_deref()
                    .is_some_and(|d| d.len() == 4 && d.chars().all(|c| c.is_ascii_digit()));
                if !last4_ok {
                    errors.push(ValidationErrorDetail::new(
                        "last4",
                        "Card last 4 digits must be exactly 4 digits",
                    ));
                }

                if self.brand.as_deref().map_or(true, |b| b.trim().is_empty()) {
                    errors.push(ValidationErrorDetail::new("brand", "Card brand is required"));
                }
            }
            PaymentMethodType::Paypal => {
                if self.email.as_deref().map_or(true, |e| e.trim().is_empty()) {
                    errors.push(ValidationErrorDetail::new(
                        "email",
                        "Please provide a valid PayPal email",
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::ValidationError(errors))
        }
    }
}

/// Result of a delete
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletePaymentMethodResponse {
    pub id: Uuid,
    /// Method that became default because the deleted one was default
    pub promoted_default: Option<Uuid>,
}

/// Loads a method and checks the caller owns it
async fn owned_method(state: &AppState, identity: &Identity, id: Uuid) -> ApiResult<PaymentMethod> {
    let method = PaymentMethod::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment method not found".to_string()))?;

    ensure_owner(identity, method.user_id)?;

    Ok(method)
}

/// List the caller's payment methods
pub async fn list_payment_methods(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ApiResponse<Vec<PaymentMethod>>>> {
    let methods = PaymentMethod::list_by_user(&state.db, identity.user_id).await?;

    Ok(ok(methods))
}

/// Add a payment method
pub async fn create_payment_method(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CreatePaymentMethodRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PaymentMethod>>)> {
    req.check()?;

    let data = match req.method_type {
        PaymentMethodType::Card => CreatePaymentMethod {
            user_id: identity.user_id,
            method_type: PaymentMethodType::Card,
            last4: req.last4,
            brand: req.brand.map(|b| b.trim().to_string()),
            expiry_month: req.expiry_month,
            expiry_year: req.expiry_year,
            paypal_email: None,
            is_default: req.is_default,
        },
        PaymentMethodType::Paypal => CreatePaymentMethod {
            user_id: identity.user_id,
            method_type: PaymentMethodType::Paypal,
            last4: None,
            brand: None,
            expiry_month: None,
            expiry_year: None,
            paypal_email: req.email.map(|e| e.trim().to_lowercase()),
            is_default: req.is_default,
        },
    };

    let method = PaymentMethod::create(&state.db, data).await?;

    tracing::info!(
        user_id = %identity.user_id,
        payment_method_id = %method.id,
        is_default = method.is_default,
        "Payment method added"
    );

    Ok(created(method))
}

/// Make a payment method the default
pub async fn set_default_payment_method(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<PaymentMethod>>> {
    owned_method(&state, &identity, id).await?;

    let method = PaymentMethod::set_default(&state.db, id, identity.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment method not found".to_string()))?;

    Ok(ok_with_message(method, "Default payment method updated"))
}

/// Remove a payment method
pub async fn delete_payment_method(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<DeletePaymentMethodResponse>>> {
    owned_method(&state, &identity, id).await?;

    let promoted_default = PaymentMethod::delete(&state.db, id, identity.user_id).await?;

    tracing::info!(user_id = %identity.user_id, payment_method_id = %id, "Payment method removed");

    Ok(ok_with_message(
        DeletePaymentMethodResponse {
            id,
            promoted_default,
        },
        "Payment method removed",
    ))
}
