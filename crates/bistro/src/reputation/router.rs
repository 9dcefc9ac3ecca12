use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use super::checkout::CartQuote;
use super::domain::{
    AccountClosure, AccountId, AccountRole, AccountStatusView, ClosureReceipt, DishId,
    FeedbackDecision, FeedbackId, FeedbackItem, FeedbackSubmission, Order, WarningEntry,
};
use super::repository::{
    AccountRepository, DishCatalog, FeedbackRepository, OrderRepository, RepositoryError,
};
use super::service::{ReputationEngine, ReputationError};

const DEFAULT_PENDING_LIMIT: usize = 50;

/// Router builder exposing the engine over JSON.
pub fn reputation_router<S, C>(engine: Arc<ReputationEngine<S, C>>) -> Router
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    Router::new()
        .route("/api/v1/accounts", post(open_account_handler::<S, C>))
        .route(
            "/api/v1/accounts/:account_id/status",
            get(status_handler::<S, C>),
        )
        .route(
            "/api/v1/accounts/:account_id/deposits",
            post(deposit_handler::<S, C>),
        )
        .route(
            "/api/v1/accounts/:account_id/warnings",
            get(warnings_handler::<S, C>),
        )
        .route(
            "/api/v1/accounts/:account_id/closure",
            post(close_account_handler::<S, C>),
        )
        .route("/api/v1/accounts/:account_id/cart", get(cart_handler::<S, C>))
        .route(
            "/api/v1/accounts/:account_id/cart/items",
            post(add_item_handler::<S, C>),
        )
        .route(
            "/api/v1/accounts/:account_id/cart/items/:dish_id",
            put(update_item_handler::<S, C>).delete(remove_item_handler::<S, C>),
        )
        .route(
            "/api/v1/accounts/:account_id/checkout",
            post(checkout_handler::<S, C>),
        )
        .route("/api/v1/feedback", post(file_feedback_handler::<S, C>))
        .route(
            "/api/v1/feedback/pending",
            get(pending_feedback_handler::<S, C>),
        )
        .route(
            "/api/v1/feedback/:feedback_id",
            get(feedback_handler::<S, C>),
        )
        .route(
            "/api/v1/feedback/:feedback_id/dispute",
            post(dispute_handler::<S, C>),
        )
        .route(
            "/api/v1/feedback/:feedback_id/resolution",
            post(resolve_handler::<S, C>),
        )
        .with_state(engine)
}

impl IntoResponse for ReputationError {
    fn into_response(self) -> Response {
        let status = match &self {
            ReputationError::NotFound(_)
            | ReputationError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            ReputationError::AlreadyResolved(_)
            | ReputationError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
            ReputationError::InsufficientBalance { .. } => StatusCode::PAYMENT_REQUIRED,
            ReputationError::AccountBlacklisted(_) | ReputationError::AccountClosed(_) => {
                StatusCode::FORBIDDEN
            }
            ReputationError::EmptyCart
            | ReputationError::UnsupportedDecision
            | ReputationError::NotDisputable(_)
            | ReputationError::SelfFeedback
            | ReputationError::TargetKindMismatch { .. }
            | ReputationError::DishUnavailable(_)
            | ReputationError::InvalidQuantity
            | ReputationError::InvalidDeposit { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ReputationError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let payload = json!({ "error": self.to_string() });
        (status, Json(payload)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAccountRequest {
    pub(crate) account_id: String,
    pub(crate) role: AccountRole,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DepositRequest {
    pub(crate) amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddItemRequest {
    pub(crate) dish_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateItemRequest {
    pub(crate) quantity: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DisputeRequest {
    pub(crate) disputed_by: String,
    pub(crate) reason: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResolutionRequest {
    pub(crate) decision: FeedbackDecision,
    #[serde(default)]
    pub(crate) note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClosureRequest {
    pub(crate) reason: AccountClosure,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PendingQuery {
    pub(crate) limit: Option<usize>,
}

type EngineState<S, C> = State<Arc<ReputationEngine<S, C>>>;

pub(crate) async fn open_account_handler<S, C>(
    State(engine): EngineState<S, C>,
    Json(request): Json<OpenAccountRequest>,
) -> Result<(StatusCode, Json<AccountStatusView>), ReputationError>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    let record = engine
        .accounts()
        .open_account(AccountId(request.account_id), request.role)?;
    Ok((StatusCode::CREATED, Json(record.status_view())))
}

pub(crate) async fn status_handler<S, C>(
    State(engine): EngineState<S, C>,
    Path(account_id): Path<String>,
) -> Result<Json<AccountStatusView>, ReputationError>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    Ok(Json(engine.account_status(&AccountId(account_id))?))
}

pub(crate) async fn deposit_handler<S, C>(
    State(engine): EngineState<S, C>,
    Path(account_id): Path<String>,
    Json(request): Json<DepositRequest>,
) -> Result<Json<AccountStatusView>, ReputationError>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    let view = engine
        .accounts()
        .deposit(&AccountId(account_id), request.amount)?;
    Ok(Json(view))
}

pub(crate) async fn warnings_handler<S, C>(
    State(engine): EngineState<S, C>,
    Path(account_id): Path<String>,
) -> Result<Json<Vec<WarningEntry>>, ReputationError>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    Ok(Json(engine.warning_history(&AccountId(account_id))?))
}

pub(crate) async fn close_account_handler<S, C>(
    State(engine): EngineState<S, C>,
    Path(account_id): Path<String>,
    Json(request): Json<ClosureRequest>,
) -> Result<Json<ClosureReceipt>, ReputationError>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    let receipt = engine.close_account(&AccountId(account_id), request.reason)?;
    Ok(Json(receipt))
}

pub(crate) async fn cart_handler<S, C>(
    State(engine): EngineState<S, C>,
    Path(account_id): Path<String>,
) -> Result<Json<CartQuote>, ReputationError>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    Ok(Json(engine.checkout_service().cart(&AccountId(account_id))?))
}

pub(crate) async fn add_item_handler<S, C>(
    State(engine): EngineState<S, C>,
    Path(account_id): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<Order>), ReputationError>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    let cart = engine
        .checkout_service()
        .add_to_cart(&AccountId(account_id), &DishId(request.dish_id))?;
    Ok((StatusCode::CREATED, Json(cart)))
}

pub(crate) async fn update_item_handler<S, C>(
    State(engine): EngineState<S, C>,
    Path((account_id, dish_id)): Path<(String, String)>,
    Json(request): Json<UpdateItemRequest>,
) -> Result<Json<Order>, ReputationError>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    let cart = engine.checkout_service().update_cart_item(
        &AccountId(account_id),
        &DishId(dish_id),
        request.quantity,
    )?;
    Ok(Json(cart))
}

pub(crate) async fn remove_item_handler<S, C>(
    State(engine): EngineState<S, C>,
    Path((account_id, dish_id)): Path<(String, String)>,
) -> Result<Json<Order>, ReputationError>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    let cart = engine
        .checkout_service()
        .remove_cart_item(&AccountId(account_id), &DishId(dish_id))?;
    Ok(Json(cart))
}

pub(crate) async fn checkout_handler<S, C>(
    State(engine): EngineState<S, C>,
    Path(account_id): Path<String>,
) -> Result<Json<Order>, ReputationError>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    Ok(Json(engine.checkout(&AccountId(account_id))?))
}

pub(crate) async fn file_feedback_handler<S, C>(
    State(engine): EngineState<S, C>,
    Json(submission): Json<FeedbackSubmission>,
) -> Result<(StatusCode, Json<FeedbackItem>), ReputationError>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    let item = engine.file_feedback(submission)?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub(crate) async fn pending_feedback_handler<S, C>(
    State(engine): EngineState<S, C>,
    Query(query): Query<PendingQuery>,
) -> Result<Json<Vec<FeedbackItem>>, ReputationError>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    let limit = query.limit.unwrap_or(DEFAULT_PENDING_LIMIT);
    Ok(Json(engine.feedback().pending_feedback(limit)?))
}

pub(crate) async fn feedback_handler<S, C>(
    State(engine): EngineState<S, C>,
    Path(feedback_id): Path<String>,
) -> Result<Json<FeedbackItem>, ReputationError>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    Ok(Json(engine.feedback().feedback(&FeedbackId(feedback_id))?))
}

pub(crate) async fn dispute_handler<S, C>(
    State(engine): EngineState<S, C>,
    Path(feedback_id): Path<String>,
    Json(request): Json<DisputeRequest>,
) -> Result<Json<FeedbackItem>, ReputationError>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    let item = engine.feedback().dispute_feedback(
        &FeedbackId(feedback_id),
        &AccountId(request.disputed_by),
        request.reason,
    )?;
    Ok(Json(item))
}

pub(crate) async fn resolve_handler<S, C>(
    State(engine): EngineState<S, C>,
    Path(feedback_id): Path<String>,
    Json(request): Json<ResolutionRequest>,
) -> Result<Json<FeedbackItem>, ReputationError>
where
    S: AccountRepository + FeedbackRepository + OrderRepository + 'static,
    C: DishCatalog + 'static,
{
    let item = engine.resolve_feedback_with_note(
        &FeedbackId(feedback_id),
        request.decision,
        request.note,
    )?;
    Ok(Json(item))
}
