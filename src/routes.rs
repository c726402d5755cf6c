// src/routes.rs

use axum::{
    Router, http::Method,
    middleware,
    routing::{get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{attempts, auth, categories, options, questions},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, catalog, attempts).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (store + config).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let category_routes = Router::new()
        .route("/", get(categories::list_categories))
        .route("/{id}", get(categories::get_category))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .merge(admin_router(
            state.clone(),
            Router::new()
                .route("/", post(categories::create_category))
                .route(
                    "/{id}",
                    put(categories::update_category).delete(categories::delete_category),
                ),
        ));

    let question_routes = Router::new()
        .route("/", get(questions::list_questions))
        .route("/{id}", get(questions::get_question))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .merge(admin_router(
            state.clone(),
            Router::new()
                .route("/", post(questions::create_question))
                .route(
                    "/{id}",
                    put(questions::update_question).delete(questions::delete_question),
                ),
        ));

    let option_routes = Router::new()
        .route("/", get(options::list_options))
        .route("/{id}", get(options::get_option))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .merge(admin_router(
            state.clone(),
            Router::new()
                .route("/", post(options::create_option))
                .route(
                    "/{id}",
                    put(options::update_option).delete(options::delete_option),
                ),
        ));

    // Submission and viewer-aware retrieval are public (the quiz runs before
    // login and anonymous attempts are permitted); listing and the completion
    // check need a token; releasing results needs an admin.
    let attempt_routes = Router::new()
        .route("/", post(attempts::submit_attempt))
        .route("/{id}", get(attempts::get_attempt))
        .merge(
            Router::new()
                .route("/", get(attempts::list_attempts))
                .route("/completed", get(attempts::has_completed))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    auth_middleware,
                )),
        )
        .merge(admin_router(
            state.clone(),
            Router::new().route("/{id}/authorize", put(attempts::authorize_attempt)),
        ));

    let result_routes = Router::new()
        .route("/", get(attempts::my_results))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/categories", category_routes)
        .nest("/api/questions", question_routes)
        .nest("/api/options", option_routes)
        .nest("/api/attempts", attempt_routes)
        .nest("/api/results", result_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Wraps a router in the auth + admin layers.
/// Auth runs first, then the role check.
fn admin_router(state: AppState, router: Router<AppState>) -> Router<AppState> {
    router
        .layer(middleware::from_fn(admin_middleware))
        .layer(middleware::from_fn_with_state(state, auth_middleware))
}
