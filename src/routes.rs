// src/routes.rs

use std::sync::Arc;

use axum::{
    Router, http::Method, middleware,
    routing::{get, patch, post},
};
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{admin, attempt, auth, catalog, performance},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, catalog, attempts, performance, admin).
/// * Applies global middleware (Trace, CORS) and rate limiting on auth.
/// * Injects global state (pool, config, scoring locks).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    // Credential endpoints are the only ones worth brute-forcing.
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(5)
            .finish()
            .unwrap(),
    );

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(GovernorLayer::new(governor_conf))
        .merge(
            Router::new()
                .route("/me", get(auth::get_me))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        );

    let catalog_routes = Router::new()
        .route("/specialties", get(catalog::list_specialties))
        .route("/specialties/{id}", get(catalog::get_specialty))
        .route("/scenarios", get(catalog::list_scenarios))
        .route("/scenarios/{id}", get(catalog::get_scenario))
        .route("/checklists", get(catalog::list_checklists))
        .route("/checklists/{id}", get(catalog::get_checklist))
        .route("/checklists/{id}/items", get(catalog::list_checklist_items))
        .route("/categories", get(catalog::list_categories))
        .route("/ranking", get(catalog::get_ranking));

    // Everything touching attempts or per-user aggregates requires a login.
    let user_routes = Router::new()
        .route(
            "/attempts",
            post(attempt::create_attempt).get(attempt::list_attempts),
        )
        .route("/attempts/{id}", get(attempt::get_attempt))
        .route("/attempts/{id}/complete", patch(attempt::complete_attempt))
        .route(
            "/users/{id}/performance",
            get(performance::get_user_performance),
        )
        .route(
            "/users/{id}/specialty-performance",
            get(performance::get_user_specialty_performance),
        )
        .route("/recommendations", get(performance::get_recommendations))
        .route("/dashboard", get(performance::get_dashboard))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/users", get(admin::list_users))
        .route("/specialties", post(admin::create_specialty))
        .route("/scenarios", post(admin::create_scenario))
        .route("/checklists", post(admin::create_checklist))
        .route(
            "/checklists/{id}/items",
            post(admin::create_checklist_item),
        )
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", catalog_routes.merge(user_routes))
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
