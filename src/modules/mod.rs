pub mod categories;
pub mod content;
pub mod products;
pub mod reviews;
pub mod upload;

use std::sync::Arc;

use uuid::Uuid;

use prerna_authz::AuthzModule;
use prerna_db::DatabaseModule;
use prerna_http::AppError;
use prerna_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register the core modules and every storefront module.
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) {
    registry.register_core(Arc::new(DatabaseModule::new(state.pool.clone())));
    registry.register_core(Arc::new(AuthzModule::new(state.guard.clone())));

    registry.register_custom(categories::create_module(state.clone()));
    registry.register_custom(products::create_module(state.clone()));
    registry.register_custom(reviews::create_module(state.clone()));
    registry.register_custom(content::create_module(state.clone()));
    registry.register_custom(upload::create_module(state.clone()));
}

/// Parse a document id taken from a path or query parameter.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::bad_request(format!("invalid id '{raw}'")))
}

/// New time-ordered document id.
pub(crate) fn new_id() -> Uuid {
    Uuid::now_v7()
}

/// Shared JSON schema fragment for `{"message": ...}` responses.
pub(crate) fn message_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": { "message": { "type": "string" } },
        "required": ["message"]
    })
}

/// OpenAPI response entry pointing at the shared error envelope.
pub(crate) fn error_response(description: &str) -> serde_json::Value {
    serde_json::json!({
        "description": description,
        "content": {
            "application/json": {
                "schema": { "$ref": "#/components/schemas/ErrorResponse" }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_id_rejects_garbage() {
        let id = new_id();
        assert_eq!(parse_id(&id.to_string()).unwrap(), id);
        assert_eq!(id.get_version_num(), 7);

        let err = parse_id("64f0c2").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
