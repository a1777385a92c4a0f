//! Axum Router Configuration
//!
//! This module defines the HTTP routing for the application: the flight lookup
//! endpoint and the OpenAPI documentation.

use crate::{
    handlers,
    models::{ErrorResponse, Query},
    state::AppState,
};

use axum::{Router, routing::post};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::get_flight_info),
    components(schemas(Query, ErrorResponse)),
    tags(
        (name = "Flight Agent API", description = "Flight status lookups answered by a search-grounded agent")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let api_router = Router::new()
        .route("/flight", post(handlers::get_flight_info))
        .with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_document_lists_flight_endpoint() {
        let doc: serde_json::Value =
            serde_json::from_str(&ApiDoc::openapi().to_json().unwrap()).unwrap();

        assert!(doc["paths"]["/flight"]["post"].is_object());
        assert!(doc["components"]["schemas"]["Query"].is_object());
        assert!(doc["components"]["schemas"]["ErrorResponse"].is_object());
    }
}
