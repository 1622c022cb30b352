//! OpenAPI documentation for the admin listener.

use utoipa::OpenApi;
use verso_types::api::{ErrorResponse, VersionResponse};
use verso_types::DEFAULT_VERSION_PATH;

#[derive(OpenApi)]
#[openapi(
    paths(crate::endpoint::handle_version),
    components(schemas(VersionResponse, ErrorResponse)),
    tags(
        (name = "Admin", description = "Administrative diagnostics")
    ),
    info(
        title = "verso admin API",
        description = "Memoized application version endpoint"
    )
)]
pub struct ApiDoc;

/// OpenAPI document with the version endpoint listed under `version_path`.
pub fn api_doc(version_path: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    if version_path != DEFAULT_VERSION_PATH {
        if let Some(item) = doc.paths.paths.remove(DEFAULT_VERSION_PATH) {
            doc.paths.paths.insert(version_path.to_string(), item);
        }
    }
    doc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_documented() {
        let doc = api_doc("/version");
        assert!(doc.paths.paths.contains_key("/version"));
    }

    #[test]
    fn test_custom_path_documented() {
        let doc = api_doc("/admin/app-version");
        assert!(doc.paths.paths.contains_key("/admin/app-version"));
        assert!(!doc.paths.paths.contains_key("/version"));
    }
}
