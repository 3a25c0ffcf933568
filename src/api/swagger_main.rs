use crate::dto;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(info(
    title = "Task Manager API",
    description = "A multi-user task tracking API written in Rust"
))]
struct TaskManagerApi;

/// Constructs the route on the API that renders the swagger UI and returns the OpenAPI schema.
/// Merges in OpenAPI definitions from other locations in the app, such as the [dto] package
/// and submodules of [api][crate::api]
pub fn build_documentation() -> SwaggerUi {
    let mut api_docs = TaskManagerApi::openapi();
    api_docs.merge(dto::OpenApiSchemas::openapi());
    api_docs.merge(super::task::TaskApi::openapi());

    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_docs)
}
