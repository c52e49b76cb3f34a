use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use mart_core::middleware::{request_id_middleware, security_headers_middleware, REQUEST_ID_HEADER};
use time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

use crate::config::ServerSettings;
use crate::handlers::{
    app::{health_check, index, unauthorized},
    auth::{
        auth_error_page, auth_error_path, sign_in_callback, sign_in_page, sign_out, start_sign_in,
    },
    dashboard::dashboard_page,
    deliveries::{
        deliveries_page, delivery_detail_page, delivery_edit_page, update_delivery,
        update_delivery_status,
    },
    inventory::{inventory_page, inventory_update_page, update_inventory},
    metrics::metrics,
    products::{
        create_product, delete_product, new_product_page, product_detail_page, products_page,
        update_product,
    },
    settings::settings_page,
};
use crate::middleware::{access_gate_middleware, metrics_middleware};
use crate::AppState;

pub fn build_router(state: AppState, server: &ServerSettings) -> Router {
    // Lax so the cookie survives the redirect back from the identity provider
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(server.secure_cookies)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(
            server.session_inactivity_minutes,
        )));

    let paths = state.gate.paths().clone();

    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        // Sign-in flow
        .route(&paths.sign_in, get(sign_in_page))
        .route(&auth_error_path(&state.gate), get(auth_error_page))
        .route("/api/auth/signin", post(start_sign_in))
        .route("/api/auth/callback", get(sign_in_callback))
        .route("/api/auth/signout", post(sign_out))
        .route(&paths.unauthorized, get(unauthorized))
        // Pages
        .route(&paths.landing, get(dashboard_page))
        .route("/products", get(products_page))
        .route("/products/new", get(new_product_page).post(create_product))
        .route(
            "/products/:id",
            get(product_detail_page).post(update_product),
        )
        .route("/products/:id/delete", post(delete_product))
        .route("/inventory", get(inventory_page))
        .route(
            "/inventory/update",
            get(inventory_update_page).post(update_inventory),
        )
        .route("/deliveries", get(deliveries_page))
        .route("/deliveries/:id", get(delivery_detail_page))
        .route(
            "/deliveries/:id/edit",
            get(delivery_edit_page).post(update_delivery),
        )
        .route("/deliveries/:id/status", post(update_delivery_status))
        .route("/settings", get(settings_page))
        .nest_service("/static", ServeDir::new(&server.static_dir))
        .layer(from_fn_with_state(state.clone(), access_gate_middleware))
        .layer(session_layer)
        .layer(from_fn(metrics_middleware))
        .layer(CompressionLayer::new())
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}
