// src/web/routes.rs
use crate::{
    state::AppState,
    web::{auth_handlers, certificate_handlers, mw_auth, mw_staff, workshop_handlers},
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/login", post(auth_handlers::handle_login))
        .route("/register", post(auth_handlers::handle_register));

    // --- Rotas de Staff (admin ou professor) ---
    let staff_routes = Router::new()
        .route("/professors", get(auth_handlers::list_professors))
        .route("/students", get(auth_handlers::list_students))
        .route("/workshops", post(workshop_handlers::create_workshop))
        .route(
            "/workshops/students",
            post(workshop_handlers::add_student).delete(workshop_handlers::remove_student),
        )
        .route("/workshops/{id}/finalize", post(workshop_handlers::finalize_workshop))
        .route(
            "/workshops/{id}/certificates",
            post(certificate_handlers::regenerate_certificates),
        )
        // mw_auth é aplicado no router pai
        .route_layer(middleware::from_fn(mw_staff::require_staff));

    // --- Rotas que exigem apenas login ---
    let member_routes = Router::new()
        .route("/workshops", get(workshop_handlers::list_workshops))
        .route("/workshops/{id}", get(workshop_handlers::get_workshop))
        .route(
            "/workshops/{id}/certificates",
            get(certificate_handlers::list_certificates),
        )
        .route(
            "/workshops/{id}/certificates/{filename}",
            get(certificate_handlers::download_certificate),
        );

    // --- Rotas Autenticadas (combinando tudo) ---
    let authenticated_routes = Router::new()
        .merge(staff_routes)
        .merge(member_routes)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    // --- Router Final ---
    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .with_state(app_state)
}
