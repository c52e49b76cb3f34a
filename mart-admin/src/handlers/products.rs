use super::error::{validation_messages, PageError};
use super::layout::{Chrome, Pager};
use crate::models::inventory::{InventoryHistory, InventoryQuery};
use crate::models::pagination::DEFAULT_PER_PAGE;
use crate::models::product::{Product, ProductForm, ProductPayload, ProductQuery};
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

const RECENT_HISTORY: u32 = 10;

#[derive(Template)]
#[template(path = "pages/products.html")]
pub struct ProductsTemplate {
    pub chrome: Chrome,
    pub products: Vec<Product>,
    pub search: String,
    pub pager: Pager,
}

/// Field values echoed back into the product form.
#[derive(Default)]
pub struct ProductFields {
    pub name: String,
    pub sku: String,
    pub price: String,
    pub stock: String,
    pub status: String,
    pub category: String,
    pub description: String,
}

impl From<&Product> for ProductFields {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            sku: product.sku.clone(),
            price: product.price.to_string(),
            stock: product.stock.to_string(),
            status: product.status.clone(),
            category: product.category_text().to_string(),
            description: product.description_text().to_string(),
        }
    }
}

impl From<&ProductForm> for ProductFields {
    fn from(form: &ProductForm) -> Self {
        Self {
            name: form.name.clone(),
            sku: form.sku.clone(),
            price: form.price.to_string(),
            stock: form.stock.to_string(),
            status: form.status.clone(),
            category: form.category.clone(),
            description: form.description.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "pages/product_form.html")]
pub struct ProductFormTemplate {
    pub chrome: Chrome,
    pub fields: ProductFields,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "pages/product_detail.html")]
pub struct ProductDetailTemplate {
    pub chrome: Chrome,
    pub product: Product,
    pub fields: ProductFields,
    pub errors: Vec<String>,
    pub histories: Vec<InventoryHistory>,
}

#[derive(Deserialize)]
pub struct ProductListParams {
    pub page: Option<u32>,
    #[serde(default)]
    pub search: String,
}

pub async fn products_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<ProductListParams>,
) -> Result<impl IntoResponse, PageError> {
    let search = params.search.trim().to_string();
    let query = ProductQuery {
        page: params.page,
        per_page: Some(DEFAULT_PER_PAGE),
        search: (!search.is_empty()).then(|| search.clone()),
        ..ProductQuery::default()
    };

    let list = state
        .backend
        .list_products(&user.access_token, &query)
        .await?;
    let pager = Pager::new(list.page_info(), "/products", &[("search", search.as_str())]);

    Ok(ProductsTemplate {
        chrome: Chrome::new(&state.gate, &user, "/products"),
        products: list.products,
        search,
        pager,
    })
}

pub async fn new_product_page(State(state): State<AppState>, user: CurrentUser) -> impl IntoResponse {
    ProductFormTemplate {
        chrome: Chrome::new(&state.gate, &user, "/products"),
        fields: ProductFields::default(),
        errors: Vec::new(),
    }
}

pub async fn create_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Form(form): Form<ProductForm>,
) -> Result<Response, PageError> {
    if let Err(errors) = form.validate() {
        let page = ProductFormTemplate {
            chrome: Chrome::new(&state.gate, &user, "/products"),
            fields: ProductFields::from(&form),
            errors: validation_messages(&errors),
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    let product = state
        .backend
        .create_product(&user.access_token, &ProductPayload::from(form))
        .await?;

    tracing::info!(
        product_id = %product.id,
        user_id = %user.claim.user_id,
        "Product created"
    );
    Ok(Redirect::to(&format!("/products/{}", product.id)).into_response())
}

async fn recent_history(
    state: &AppState,
    user: &CurrentUser,
    product_id: &str,
) -> Vec<InventoryHistory> {
    let query = InventoryQuery {
        per_page: Some(RECENT_HISTORY),
        ..InventoryQuery::default()
    };

    // History is secondary on the detail page; show the product without it
    match state
        .backend
        .product_inventory_histories(&user.access_token, product_id, &query)
        .await
    {
        Ok(list) => list.histories,
        Err(e) => {
            tracing::warn!(product_id = %product_id, error = %e, "Failed to load inventory history");
            Vec::new()
        }
    }
}

pub async fn product_detail_page(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, PageError> {
    let product = state.backend.get_product(&user.access_token, &id).await?;
    let histories = recent_history(&state, &user, &id).await;

    Ok(ProductDetailTemplate {
        chrome: Chrome::new(&state.gate, &user, "/products"),
        fields: ProductFields::from(&product),
        product,
        errors: Vec::new(),
        histories,
    })
}

pub async fn update_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<ProductForm>,
) -> Result<Response, PageError> {
    if let Err(errors) = form.validate() {
        let product = state.backend.get_product(&user.access_token, &id).await?;
        let histories = recent_history(&state, &user, &id).await;
        let page = ProductDetailTemplate {
            chrome: Chrome::new(&state.gate, &user, "/products"),
            fields: ProductFields::from(&form),
            product,
            errors: validation_messages(&errors),
            histories,
        };
        return Ok((StatusCode::UNPROCESSABLE_ENTITY, page).into_response());
    }

    state
        .backend
        .update_product(&user.access_token, &id, &ProductPayload::from(form))
        .await?;

    tracing::info!(product_id = %id, user_id = %user.claim.user_id, "Product updated");
    Ok(Redirect::to(&format!("/products/{id}")).into_response())
}

pub async fn delete_product(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Redirect, PageError> {
    state.backend.delete_product(&user.access_token, &id).await?;

    tracing::info!(product_id = %id, user_id = %user.claim.user_id, "Product deleted");
    Ok(Redirect::to("/products"))
}
