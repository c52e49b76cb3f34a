use super::error::{validation_messages, PageError};
use super::layout::{Chrome, Pager, SelectOption};
use crate::models::delivery::{
    Delivery, DeliveryEditForm, DeliveryHistoryEntry, DeliveryQuery, DeliveryStatus,
    DeliveryStatusUpdate,
};
use crate::models::pagination::DEFAULT_PER_PAGE;
use crate::models::CurrentUser;
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use validator::Validate;

#[derive(Template)]
#[template(path = "pages/deliveries.html")]
pub struct DeliveriesTemplate {
    pub chrome: Chrome,
    pub deliveries: Vec<Delivery>,
    pub search: String,
    pub statuses: Vec<SelectOption>,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "pages/delivery_detail.html")]
pub struct DeliveryDetailTemplate {
    pub chrome: Chrome,
    pub delivery: Delivery,
    pub history: Vec<DeliveryHistoryEntry>,
    pub statuses: Vec<SelectOption>,
}

#[derive(Template)]
#[template(path = "pages/delivery_edit.html")]
pub struct DeliveryEditTemplate {
    pub chrome: Chrome,
    pub delivery: Delivery,
    pub form: DeliveryEditForm,
    pub statuses: Vec<SelectOption>,
    pub errors: Vec<String>,
}

#[derive(Deserialize)]
pub struct DeliveryParams {
    pub page: Option<u32>,
    /// Wire value of the status; empty for all.
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub search: String,
}

pub async fn deliveries_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<DeliveryParams>,
) -> Result<impl IntoResponse, PageError> {
    let search = params.search.trim().to_string();
    let status = DeliveryStatus::from_wire(&params.status);
    let query = DeliveryQuery {
        page: params.page,
        limit: Some(DEFAULT_PER_PAGE),
        status,
        search: (!search.is_empty()).then(|| search.clone()),
    };

    let list = state
        .backend
        .list_deliveries(&user.access_token, &query)
        .await?;

    let selected = status.map(DeliveryStatus::wire).unwrap_or_default();
    let pager = Pager::new(
        list.page_info(DEFAULT_PER_PAGE),
        "/deliveries",
        &[("status", selected), ("search", search.as_str())],
    );

    Ok(DeliveriesTemplate {
        chrome: Chrome::new(&state.gate, &user, "/deliveries"),
        deliveries: list.deliveries,
        search,
        statuses: SelectOption::with_all(
            &DeliveryStatus::ALL,
            DeliveryStatus::wire,
            DeliveryStatus::label,
            selected,
        ),
        pager,
    })
}

fn status_options(selected: &str) -> Vec<SelectOption> {
    DeliveryStatus::ALL
        .into_iter()
        .map(|status| SelectOption {
            value: status.wire().to_string(),
            label: status.label().to_string(),
            selected: status.wire() == selected,
        })
        .collect()
}

async fn delivery_history(
    state: &AppState,
    user: &CurrentUser,
    id: &str,
) -> Vec<DeliveryHistoryEntry> {
    // The detail page still renders when the history service is down
    match state.backend.delivery_history(&user.access_token, id).await {
        Ok(history) => history.history,
        Err(e) => {
            tracing::warn!(delivery_id = %id, error = %e, "Failed to load delivery history");
            Vec::new()
        }
    }
}

pub async fn delivery_detail_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, PageError> {
    let delivery = state.backend.get_delivery(&user.access_token, &id).await?;
    let history = delivery_history(&state, &user, &id).await;

    Ok(DeliveryDetailTemplate {
        chrome: Chrome::new(&state.gate, &user, "/deliveries"),
        statuses: status_options(delivery.status.wire()),
        delivery,
        history,
    })
}

pub async fn delivery_edit_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, PageError> {
    let delivery = state.backend.get_delivery(&user.access_token, &id).await?;
    let form = DeliveryEditForm::from(&delivery);

    Ok(DeliveryEditTemplate {
        chrome: Chrome::new(&state.gate, &user, "/deliveries"),
        statuses: status_options(&form.status),
        delivery,
        form,
        errors: Vec::new(),
    })
}

pub async fn update_delivery(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<DeliveryEditForm>,
) -> Result<Response, PageError> {
    if let Err(errors) = form.validate() {
        let delivery = state.backend.get_delivery(&user.access_token, &id).await?;
        let page = DeliveryEditTemplate {
            chrome: Chrome::new(&state.gate, &user, "/deliveries"),
            statuses: status_options(&form.status),
            delivery,
            errors: validation_messages(&errors),
            form,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    let delivery = state
        .backend
        .update_delivery(&user.access_token, &id, &form.to_update())
        .await?;

    tracing::info!(
        delivery_id = %id,
        status = delivery.status.wire(),
        user_id = %user.claim.user_id,
        "Delivery updated"
    );
    Ok(Redirect::to(&format!("/deliveries/{id}")).into_response())
}

pub async fn update_delivery_status(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(update): Form<DeliveryStatusUpdate>,
) -> Result<Redirect, PageError> {
    let delivery = state
        .backend
        .update_delivery_status(&user.access_token, &id, &update)
        .await?;

    tracing::info!(
        delivery_id = %id,
        status = delivery.status.wire(),
        user_id = %user.claim.user_id,
        "Delivery status updated"
    );
    Ok(Redirect::to(&format!("/deliveries/{id}")))
}
