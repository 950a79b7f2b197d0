/// Billing endpoints
///
/// # Endpoints
///
/// - `GET /api/billing/overview` - Subscription, plan, usage and limits
/// - `GET /api/billing/plans` - Plan catalog
/// - `GET /api/billing/history` - Invoices, newest first (paginated)
/// - `POST /api/billing/subscription/change` - Switch tier without billing
/// - `POST /api/billing/subscription/upgrade` - Switch tier and invoice paid tiers
/// - `POST /api/billing/subscription/cancel` - Back to free, canceled
/// - `GET /api/billing/address`, `PUT /api/billing/address` - Billing address
///
/// No payment is ever taken; invoices are bookkeeping records only.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{Json, Query},
    response::{ok, ok_with_message, ApiResponse, PageQuery, Paginated},
};
use axum::{extract::State, Extension};
use chrono::Utc;
use qconvert_shared::{
    auth::identity::Identity,
    catalog::plans::{Plan, PlanLimits},
    models::{
        billing_address::{BillingAddress, UpsertBillingAddress},
        invoice::{CreateInvoice, Invoice, InvoiceStatus},
        subscription::{next_period_end, Subscription, SubscriptionTier},
    },
    usage::UsageReport,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Billing overview
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingOverview {
    pub subscription: Subscription,
    pub plan: Plan,
    pub usage: UsageReport,
    pub limits: PlanLimits,
    /// Resources whose usage has reached the plan limit
    pub at_limit: Vec<&'static str>,
}

/// Body of the subscription change and upgrade endpoints
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub plan_id: Option<String>,
}

impl PlanRequest {
    fn tier(&self) -> ApiResult<SubscriptionTier> {
        let plan_id = self
            .plan_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::BadRequest("Plan ID is required".to_string()))?;

        SubscriptionTier::parse(plan_id)
            .ok_or_else(|| ApiError::BadRequest(format!("Invalid plan ID: {}", plan_id)))
    }
}

/// Upgrade result
#[derive(Debug, Serialize)]
pub struct UpgradeResponse {
    pub subscription: Subscription,
    /// Present only for paid tiers
    pub invoice: Option<Invoice>,
}

/// Billing address body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 200, message = "Address line 1 is required"))]
    pub line1: String,

    #[validate(length(max = 200, message = "Address line 2 must be at most 200 characters"))]
    pub line2: Option<String>,

    #[validate(length(min = 1, max = 100, message = "City is required"))]
    pub city: String,

    #[validate(length(max = 100, message = "State must be at most 100 characters"))]
    pub state: Option<String>,

    #[validate(length(min = 1, max = 20, message = "Postal code is required"))]
    pub postal_code: String,

    #[validate(length(equal = 2, message = "Country must be a 2-letter code"))]
    pub country: String,
}

fn plan_for<'a>(state: &'a AppState, tier: SubscriptionTier) -> ApiResult<&'a Plan> {
    state
        .catalogs
        .plans
        .get(tier)
        .ok_or_else(|| ApiError::InternalError(format!("No plan for tier {}", tier.as_str())))
}

/// Billing overview
///
/// Creates a free subscription on first read and backfills a missing period
/// end 30 days out.
pub async fn overview(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ApiResponse<BillingOverview>>> {
    let mut subscription = Subscription::get_or_create(&state.db, identity.user_id).await?;

    if subscription.current_period_end.is_none() {
        subscription =
            Subscription::set_period_end(&state.db, subscription.id, next_period_end(Utc::now()))
                .await?;
    }

    let usage = UsageReport::collect(&state.db, identity.user_id).await?;
    let plan = plan_for(&state, subscription.tier)?.clone();
    let at_limit = usage.at_limit(&plan.limits);

    Ok(ok(BillingOverview {
        limits: plan.limits,
        subscription,
        plan,
        usage,
        at_limit,
    }))
}

/// Plan catalog
pub async fn plans(State(state): State<AppState>) -> Json<ApiResponse<Vec<Plan>>> {
    ok(state.catalogs.plans.all().to_vec())
}

/// Invoice history, newest first
pub async fn history(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<ApiResponse<Paginated<Invoice>>>> {
    let page = query.resolve();

    let invoices =
        Invoice::list_by_user(&state.db, identity.user_id, page.limit, page.offset()).await?;
    let total = Invoice::count_by_user(&state.db, identity.user_id).await?;

    Ok(ok(Paginated::new(invoices, page, total)))
}

/// Switch tier without creating an invoice
pub async fn change_subscription(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: Option<Json<PlanRequest>>,
) -> ApiResult<Json<ApiResponse<Subscription>>> {
    let tier = body.map(|Json(b)| b).unwrap_or_default().tier()?;

    let subscription = Subscription::change_tier(&state.db, identity.user_id, tier).await?;

    tracing::info!(user_id = %identity.user_id, tier = tier.as_str(), "Subscription changed");

    Ok(ok_with_message(subscription, "Subscription updated"))
}

/// Switch tier and create one paid invoice for non-free tiers
pub async fn upgrade_subscription(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    body: Option<Json<PlanRequest>>,
) -> ApiResult<Json<ApiResponse<UpgradeResponse>>> {
    let tier = body.map(|Json(b)| b).unwrap_or_default().tier()?;
    let plan = plan_for(&state, tier)?;

    let subscription = Subscription::change_tier(&state.db, identity.user_id, tier).await?;

    let invoice = if plan.is_paid() {
        let now = Utc::now();
        let invoice = Invoice::create(
            &state.db,
            CreateInvoice {
                user_id: identity.user_id,
                plan: tier,
                amount_cents: plan.price_cents(),
                currency: plan.currency.to_string(),
                status: InvoiceStatus::Paid,
                description: format!("QConvert {} plan - monthly subscription", plan.name),
                due_date: next_period_end(now),
                paid_at: Some(now),
            },
        )
        .await?;

        tracing::info!(
            user_id = %identity.user_id,
            invoice = %invoice.invoice_number,
            "Invoice created for upgrade"
        );
        Some(invoice)
    } else {
        None
    };

    Ok(ok_with_message(
        UpgradeResponse {
            subscription,
            invoice,
        },
        format!("Upgraded to {} plan", plan.name),
    ))
}

/// Cancel: tier free, status canceled, no period end
pub async fn cancel_subscription(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ApiResponse<Subscription>>> {
    let subscription = Subscription::cancel(&state.db, identity.user_id).await?;

    tracing::info!(user_id = %identity.user_id, "Subscription canceled");

    Ok(ok_with_message(subscription, "Subscription canceled"))
}

/// The caller's billing address, or `null`
pub async fn get_address(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<ApiResponse<Option<BillingAddress>>>> {
    let address = BillingAddress::find_by_user(&state.db, identity.user_id).await?;

    Ok(ok(address))
}

/// Insert or replace the caller's billing address
pub async fn update_address(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<AddressRequest>,
) -> ApiResult<Json<ApiResponse<BillingAddress>>> {
    let trimmed = |s: String| s.trim().to_string();
    let optional = |s: Option<String>| s.map(trimmed).filter(|s| !s.is_empty());

    let req = AddressRequest {
        name: trimmed(req.name),
        line1: trimmed(req.line1),
        line2: optional(req.line2),
        city: trimmed(req.city),
        state: optional(req.state),
        postal_code: trimmed(req.postal_code),
        country: trimmed(req.country),
    };
    req.validate()?;

    let address = BillingAddress::upsert(
        &state.db,
        identity.user_id,
        UpsertBillingAddress {
            name: req.name,
            line1: req.line1,
            line2: req.line2,
            city: req.city,
            state: req.state,
            postal_code: req.postal_code,
            country: req.country,
        },
    )
    .await?;

    Ok(ok_with_message(address, "Billing address updated"))
}
