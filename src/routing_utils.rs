use axum::extract::FromRequestParts;
use axum::extract::rejection::JsonRejection;
use axum::http::request::Parts;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum_macros::FromRequest;

use serde::Serialize;
use utoipa::openapi::{RefOr, Schema};
use utoipa::{ToResponse, ToSchema, openapi};

use validator::ValidationErrors;

use crate::domain;

/// Contains diagnostic information about an API failure
#[derive(Serialize, Debug, ToResponse)]
#[response(examples(
    ("Unauthenticated" = (
        summary = "The request credential was missing or invalid (401)",
        value = json!({
            "error_code": "unauthenticated",
            "error_description": "The request did not carry a valid credential.",
            "extra_info": null
        })
    )),

    ("Not Found" = (
        summary = "Entity could not be found (404)",
        value = json!({
            "error_code": "not_found",
            "error_description": "The requested entity could not be found.",
            "extra_info": null
        })
    )),

    ("Internal Failure" = (
        summary = "Something unexpected went wrong inside the server (500)",
        value = json!({
            "error_code": "internal_error",
            "error_description": "Could not access data to complete your request",
            "extra_info": null
        })
    )),

    ("Invalid Input" = (
        summary = "Invalid request body was passed (400)",
        value = json!({
            "error_code": "invalid_input",
            "error_description": "Submitted data was invalid.",
            "extra_info": {
                "description": [
                    {
                        "code": "not_blank",
                        "message": null,
                        "params": {
                            "value": "   "
                        }
                    }
                ]
            }
        })
    )),

    ("Invalid Update" = (
        summary = "A patch tried to modify fields outside the allowed set (400)",
        value = json!({
            "error_code": "invalid_update",
            "error_description": "The update contains fields which may not be modified.",
            "extra_info": "Disallowed fields in update: owner"
        })
    ))
))]
pub struct BasicErrorResponse {
    error_code: String,
    error_description: String,
    extra_info: Option<ExtraInfo>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(untagged)]
pub enum ExtraInfo {
    ValidationIssues(ValidationErrorSchema),
    Message(String),
}

/// Stand-in OpenAPI schema for [ValidationErrors] which just provides an empty object
#[derive(Serialize, Debug)]
#[serde(transparent)]
pub struct ValidationErrorSchema(ValidationErrors);

impl<'schem> ToSchema<'schem> for ValidationErrorSchema {
    fn schema() -> (&'schem str, RefOr<Schema>) {
        (
            "ValidationErrorSchema",
            openapi::ObjectBuilder::new().into(),
        )
    }
}

/// Response type that maps task domain errors onto [BasicErrorResponse]s
pub enum TaskErrorResponse {
    BadInput,
    NotFound,
    Internal,
}

impl IntoResponse for TaskErrorResponse {
    fn into_response(self) -> Response {
        match self {
            Self::BadInput => (
                StatusCode::BAD_REQUEST,
                Json(BasicErrorResponse {
                    error_code: "invalid_input".into(),
                    error_description: "Submitted data was invalid.".into(),
                    extra_info: None,
                }),
            )
                .into_response(),

            Self::NotFound => (
                StatusCode::NOT_FOUND,
                Json(BasicErrorResponse {
                    error_code: "not_found".into(),
                    error_description: "The requested entity could not be found.".into(),
                    extra_info: None,
                }),
            )
                .into_response(),

            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(BasicErrorResponse {
                    error_code: "internal_error".into(),
                    error_description: "Could not access data to complete your request".into(),
                    extra_info: None,
                }),
            )
                .into_response(),
        }
    }
}

impl From<domain::task::driving_ports::TaskError> for TaskErrorResponse {
    fn from(value: domain::task::driving_ports::TaskError) -> Self {
        match value {
            domain::task::driving_ports::TaskError::BlankDescription => Self::BadInput,
            domain::task::driving_ports::TaskError::NotFound => Self::NotFound,
            domain::task::driving_ports::TaskError::PortError(_) => Self::Internal,
        }
    }
}

/// Response type that maps authentication failures onto [BasicErrorResponse]s
pub enum AuthErrorResponse {
    Unauthenticated,
    Internal,
}

impl IntoResponse for AuthErrorResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                Json(BasicErrorResponse {
                    error_code: "unauthenticated".into(),
                    error_description: "The request did not carry a valid credential.".into(),
                    extra_info: None,
                }),
            )
                .into_response(),

            Self::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(BasicErrorResponse {
                    error_code: "internal_error".into(),
                    error_description: "Could not access data to complete your request".into(),
                    extra_info: None,
                }),
            )
                .into_response(),
        }
    }
}

impl From<domain::auth::AuthError> for AuthErrorResponse {
    fn from(value: domain::auth::AuthError) -> Self {
        match value {
            domain::auth::AuthError::InvalidCredential => Self::Unauthenticated,
            domain::auth::AuthError::PortError(_) => Self::Internal,
        }
    }
}

/// Response type rejecting a patch that tries to modify fields outside the allowed set
pub struct DisallowedFieldsResponse(pub Vec<String>);

impl IntoResponse for DisallowedFieldsResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(BasicErrorResponse {
                error_code: "invalid_update".into(),
                error_description: "The update contains fields which may not be modified.".into(),
                extra_info: Some(ExtraInfo::Message(format!(
                    "Disallowed fields in update: {}",
                    self.0.join(", ")
                ))),
            }),
        )
            .into_response()
    }
}

/// Response type that wraps validation errors and turns them into [BasicErrorResponse]s
pub struct ValidationErrorResponse(ValidationErrors);

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(BasicErrorResponse {
                error_code: "invalid_input".into(),
                error_description: "Submitted data was invalid.".to_owned(),
                extra_info: Some(ExtraInfo::ValidationIssues(ValidationErrorSchema(self.0))),
            }),
        )
            .into_response()
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(value: ValidationErrors) -> Self {
        Self(value)
    }
}

/// Wrapper for [axum::Json] which customizes the error response to use our
/// data structure for API errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(JsonErrorResponse))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Response type representing JSON parse errors
pub struct JsonErrorResponse {
    parse_problem: String,
}

impl From<JsonRejection> for JsonErrorResponse {
    fn from(value: JsonRejection) -> Self {
        JsonErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for JsonErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            axum::Json(BasicErrorResponse {
                error_code: "invalid_json".into(),
                error_description:
                    "The passed request body contained malformed or unreadable JSON.".into(),
                extra_info: Some(ExtraInfo::Message(self.parse_problem)),
            }),
        )
            .into_response()
    }
}

/// Extracts the bearer credential from a request's Authorization header. Requests
/// without a well-formed `Authorization: Bearer <token>` header are rejected with
/// a 401 before the handler runs.
pub struct BearerToken(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AuthErrorResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());

        match raw_header.and_then(|value| value.strip_prefix("Bearer ")) {
            Some(token) if !token.is_empty() => Ok(BearerToken(token.to_owned())),
            _ => Err(AuthErrorResponse::Unauthenticated),
        }
    }
}
