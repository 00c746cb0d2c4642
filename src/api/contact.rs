//! Contact API endpoints
//!
//! Public:
//! - GET /contact - contact card and featured FAQs
//! - POST /contact - full contact form
//! - POST /contact/quick - quick form, answers `{success, message | errors}`
//! - GET /contact/faqs?category=
//! - GET /contact/info
//!
//! Admin inbox, replies, FAQ management and the contact card live under
//! /admin.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;

use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, ClientMeta};
use crate::models::{
    ContactInfo, ContactInfoInput, ContactMessage, Faq, FaqCategory, FaqInput, MessageStatus,
    Priority, SubmitContactInput, UpdateFaqInput,
};
use crate::services::contact::{
    ContactPage, FaqListPage, MessageDetail, MessageListPage, MessageListQuery,
    QuickContactInput, QuickContactResponse, ReplyInput, ReplyOutcome, SubmitOutcome,
};
use crate::services::ClientInfo;

#[derive(Debug, Deserialize)]
pub struct FaqQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: MessageStatus,
}

#[derive(Debug, Deserialize)]
pub struct PriorityRequest {
    pub priority: Priority,
}

pub fn public_router() -> Router<AppState> {
    Router::new()
        .route("/contact", get(contact_page).post(submit))
        .route("/contact/quick", post(quick_contact))
        .route("/contact/faqs", get(faq_list))
        .route("/contact/info", get(contact_info))
}

pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/admin/contact/messages", get(list_messages))
        .route(
            "/admin/contact/messages/{id}",
            get(message_detail).delete(delete_message),
        )
        .route("/admin/contact/messages/{id}/reply", post(reply))
        .route("/admin/contact/messages/{id}/status", put(set_status))
        .route("/admin/contact/messages/{id}/priority", put(set_priority))
        .route("/admin/contact/info", put(update_contact_info))
        .route("/admin/faqs", post(create_faq))
        .route(
            "/admin/faqs/{id}",
            get(get_faq).put(update_faq).delete(delete_faq),
        )
}

fn client_info(client: ClientMeta) -> ClientInfo {
    ClientInfo::new(client.ip, client.user_agent)
}

// ============================================================================
// Public
// ============================================================================

async fn contact_page(State(state): State<AppState>) -> Result<Json<ContactPage>, ApiError> {
    Ok(Json(state.contact_service.contact_page().await?))
}

/// POST /api/v1/contact
async fn submit(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(body): Json<SubmitContactInput>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome: SubmitOutcome = state
        .contact_service
        .submit(body, &client_info(client))
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /api/v1/contact/quick
///
/// Field errors come back as `{success: false, errors}` with 200.
async fn quick_contact(
    State(state): State<AppState>,
    client: ClientMeta,
    Json(body): Json<QuickContactInput>,
) -> Result<Json<QuickContactResponse>, ApiError> {
    let response = state
        .contact_service
        .quick_contact(body, &client_info(client))
        .await?;
    Ok(Json(response))
}

/// GET /api/v1/contact/faqs?category=
///
/// An unknown category shows every group.
async fn faq_list(
    State(state): State<AppState>,
    Query(query): Query<FaqQuery>,
) -> Result<Json<FaqListPage>, ApiError> {
    let category = query
        .category
        .as_deref()
        .and_then(|c| c.parse::<FaqCategory>().ok());
    Ok(Json(state.contact_service.faq_list(category).await?))
}

async fn contact_info(
    State(state): State<AppState>,
) -> Result<Json<Option<ContactInfo>>, ApiError> {
    Ok(Json(state.contact_service.contact_info().await?))
}

// ============================================================================
// Admin inbox
// ============================================================================

/// GET /api/v1/admin/contact/messages?status=&search=&page=
async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<MessageListQuery>,
) -> Result<Json<MessageListPage>, ApiError> {
    Ok(Json(state.contact_service.list_messages(&query).await?))
}

/// GET /api/v1/admin/contact/messages/{id} - marks a new message read
async fn message_detail(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageDetail>, ApiError> {
    Ok(Json(state.contact_service.message_detail(id).await?))
}

/// POST /api/v1/admin/contact/messages/{id}/reply
///
/// The reply is stored even when the email could not be sent; `sent`
/// and `message` report the outcome.
async fn reply(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<ReplyInput>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome: ReplyOutcome = state.contact_service.reply(id, &admin, body).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<ContactMessage>, ApiError> {
    Ok(Json(state.contact_service.set_status(id, body.status).await?))
}

async fn set_priority(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<PriorityRequest>,
) -> Result<Json<ContactMessage>, ApiError> {
    Ok(Json(state.contact_service.set_priority(id, body.priority).await?))
}

async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.contact_service.delete_message(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/admin/contact/info - upsert the active contact card
async fn update_contact_info(
    State(state): State<AppState>,
    Json(body): Json<ContactInfoInput>,
) -> Result<Json<ContactInfo>, ApiError> {
    Ok(Json(state.contact_service.update_contact_info(body).await?))
}

// ============================================================================
// FAQ management
// ============================================================================

async fn create_faq(
    State(state): State<AppState>,
    Json(body): Json<FaqInput>,
) -> Result<impl IntoResponse, ApiError> {
    let faq = state.contact_service.create_faq(body).await?;
    Ok((StatusCode::CREATED, Json(faq)))
}

async fn get_faq(State(state): State<AppState>, Path(id): Path<i64>) -> Result<Json<Faq>, ApiError> {
    Ok(Json(state.contact_service.get_faq(id).await?))
}

async fn update_faq(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateFaqInput>,
) -> Result<Json<Faq>, ApiError> {
    Ok(Json(state.contact_service.update_faq(id, body).await?))
}

async fn delete_faq(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.contact_service.delete_faq(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
