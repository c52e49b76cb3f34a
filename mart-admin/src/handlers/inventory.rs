use super::error::{validation_messages, PageError};
use super::layout::{Chrome, Pager, SelectOption};
use crate::models::inventory::{InventoryChange, InventoryHistory, InventoryQuery, InventoryUpdate};
use crate::models::pagination::DEFAULT_PER_PAGE;
use crate::models::product::ProductQuery;
use crate::models::CurrentUser;
use crate::AppState;
use askama::Template;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use validator::Validate;

const PRODUCT_CHOICES: u32 = 100;

#[derive(Template)]
#[template(path = "pages/inventory.html")]
pub struct InventoryTemplate {
    pub chrome: Chrome,
    pub histories: Vec<InventoryHistory>,
    pub product_id: String,
    pub changes: Vec<SelectOption>,
    pub pager: Pager,
}

#[derive(Template)]
#[template(path = "pages/inventory_update.html")]
pub struct InventoryUpdateTemplate {
    pub chrome: Chrome,
    pub products: Vec<SelectOption>,
    pub changes: Vec<SelectOption>,
    pub quantity: String,
    pub reason: String,
    pub note: String,
    pub errors: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryParams {
    pub page: Option<u32>,
    #[serde(default)]
    pub product_id: String,
    /// Wire value of the change type; empty for all.
    #[serde(default, rename = "type")]
    pub change: String,
}

pub async fn inventory_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<InventoryParams>,
) -> Result<impl IntoResponse, PageError> {
    let product_id = params.product_id.trim().to_string();
    let change = InventoryChange::from_wire(&params.change);
    let query = InventoryQuery {
        page: params.page,
        per_page: Some(DEFAULT_PER_PAGE),
        product_id: (!product_id.is_empty()).then(|| product_id.clone()),
        change,
    };

    let list = state
        .backend
        .list_inventory_histories(&user.access_token, &query)
        .await?;

    let selected = change.map(InventoryChange::wire).unwrap_or_default();
    let pager = Pager::new(
        list.page_info(),
        "/inventory",
        &[("productId", product_id.as_str()), ("type", selected)],
    );

    Ok(InventoryTemplate {
        chrome: Chrome::new(&state.gate, &user, "/inventory"),
        histories: list.histories,
        product_id,
        changes: SelectOption::with_all(
            &InventoryChange::ALL,
            InventoryChange::wire,
            InventoryChange::label,
            selected,
        ),
        pager,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateParams {
    #[serde(default)]
    pub product_id: String,
}

fn change_options(selected: InventoryChange) -> Vec<SelectOption> {
    InventoryChange::ALL
        .into_iter()
        .map(|change| SelectOption {
            value: change.wire().to_string(),
            label: change.label().to_string(),
            selected: change == selected,
        })
        .collect()
}

async fn product_options(
    state: &AppState,
    user: &CurrentUser,
    selected: &str,
) -> Result<Vec<SelectOption>, PageError> {
    let query = ProductQuery {
        per_page: Some(PRODUCT_CHOICES),
        ..ProductQuery::default()
    };
    let list = state.backend.list_products(&user.access_token, &query).await?;

    Ok(list
        .products
        .into_iter()
        .map(|product| SelectOption {
            selected: product.id == selected,
            label: format!("{} ({})", product.name, product.sku),
            value: product.id,
        })
        .collect())
}

pub async fn inventory_update_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<UpdateParams>,
) -> Result<impl IntoResponse, PageError> {
    Ok(InventoryUpdateTemplate {
        chrome: Chrome::new(&state.gate, &user, "/inventory"),
        products: product_options(&state, &user, &params.product_id).await?,
        changes: change_options(InventoryChange::Inbound),
        quantity: String::new(),
        reason: String::new(),
        note: String::new(),
        errors: Vec::new(),
    })
}

pub async fn update_inventory(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(mut update): Form<InventoryUpdate>,
) -> Result<Response, PageError> {
    update.reason = update.reason.trim().to_string();
    update.note = update
        .note
        .take()
        .map(|note| note.trim().to_string())
        .filter(|note| !note.is_empty());

    if let Err(errors) = update.validate() {
        let page = InventoryUpdateTemplate {
            chrome: Chrome::new(&state.gate, &user, "/inventory"),
            products: product_options(&state, &user, &update.product_id).await?,
            changes: change_options(update.change),
            quantity: update.quantity.to_string(),
            reason: update.reason.clone(),
            note: update.note.clone().unwrap_or_default(),
            errors: validation_messages(&errors),
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    state
        .backend
        .update_inventory(&user.access_token, &update)
        .await?;

    tracing::info!(
        product_id = %update.product_id,
        change = update.change.wire(),
        quantity = update.quantity,
        user_id = %user.claim.user_id,
        "Inventory adjusted"
    );
    Ok(Redirect::to(&format!("/products/{}", update.product_id)).into_response())
}
