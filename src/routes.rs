use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware, AppState};

/// Assemble the JSON API, the HTML pages and the global middleware stack
pub fn create_router(app_state: AppState) -> Router {
    let config = app_state.config.clone();

    // Credential checks, throttled per client IP
    let throttled_routes = Router::new()
        .route("/api/auth/login", post(handlers::auth_handlers::login_local))
        .route(
            "/login",
            get(handlers::ui_handlers::login_form).post(handlers::ui_handlers::login_submit),
        )
        .route_layer(from_fn_with_state(
            app_state.rate_limiter.clone(),
            middleware::ip_rate_limit_middleware,
        ));

    // Unauthenticated and unthrottled, including node progress callbacks
    let public_routes = Router::new()
        .route(
            "/api/callback/:node_id",
            post(handlers::scan_handlers::scan_callback),
        )
        .route("/api/health", get(handlers::health_check))
        .route("/api/health/simple", get(handlers::health_check_simple))
        .route("/api/health/ready", get(handlers::readiness_check))
        .route("/api/health/live", get(handlers::liveness_check))
        .route("/api/auth/logout", post(handlers::auth_handlers::logout))
        .route("/logout", get(handlers::ui_handlers::logout));

    // Protected API routes (require API key or session)
    let api_routes = Router::new()
        .route("/api/auth/me", get(handlers::auth_handlers::get_me))
        .route(
            "/api/nodes",
            get(handlers::node_handlers::list_nodes).post(handlers::node_handlers::create_node),
        )
        .route(
            "/api/nodes/:id",
            get(handlers::node_handlers::get_node)
                .patch(handlers::node_handlers::update_node)
                .delete(handlers::node_handlers::delete_node),
        )
        .route(
            "/api/nodes/:id/status",
            get(handlers::node_handlers::node_status),
        )
        .route(
            "/api/assets",
            get(handlers::asset_handlers::list_assets).post(handlers::asset_handlers::create_asset),
        )
        .route(
            "/api/assets/:id",
            get(handlers::asset_handlers::get_asset)
                .patch(handlers::asset_handlers::update_asset)
                .delete(handlers::asset_handlers::delete_asset),
        )
        .route(
            "/api/scans",
            get(handlers::scan_handlers::list_scans).post(handlers::scan_handlers::launch_scan),
        )
        .route(
            "/api/scans/:id",
            get(handlers::scan_handlers::get_scan).delete(handlers::scan_handlers::delete_scan),
        )
        .route(
            "/api/scans/:id/refresh",
            post(handlers::scan_handlers::refresh_scan),
        )
        .route(
            "/api/users",
            get(handlers::user_handlers::list_users).post(handlers::user_handlers::create_user),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::auth_middleware,
        ));

    // Protected pages (redirect to the login form)
    let ui_routes = Router::new()
        .route("/", get(handlers::ui_handlers::dashboard))
        .route(
            "/nodes",
            get(handlers::ui_handlers::nodes).post(handlers::ui_handlers::create_node),
        )
        .route("/nodes/:id/delete", post(handlers::ui_handlers::delete_node))
        .route(
            "/assets",
            get(handlers::ui_handlers::assets).post(handlers::ui_handlers::create_asset),
        )
        .route("/assets/:id/delete", post(handlers::ui_handlers::delete_asset))
        .route(
            "/scans",
            get(handlers::ui_handlers::scans).post(handlers::ui_handlers::launch_scan),
        )
        .route("/scans/:id", get(handlers::ui_handlers::scan_detail))
        .route("/scans/:id/refresh", post(handlers::ui_handlers::refresh_scan))
        .route("/scans/:id/delete", post(handlers::ui_handlers::delete_scan))
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::ui_auth_middleware,
        ));

    let app = Router::new()
        .merge(throttled_routes)
        .merge(public_routes)
        .merge(api_routes)
        .merge(ui_routes)
        .with_state(app_state)
        .layer(from_fn(middleware::security_headers_middleware));

    let app = if config.is_production() {
        app.layer(from_fn(middleware::hsts_middleware))
    } else {
        app
    };

    app.layer(from_fn(middleware::request_logging_middleware))
        .layer(middleware::create_logging_layer())
        .layer(middleware::create_cors_layer(
            &config.cors_allow_origins,
            &config.api_key_header,
        ))
}
