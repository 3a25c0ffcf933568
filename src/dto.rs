use crate::domain;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::{IntoParams, OpenApi, ToSchema};
use validator::{Validate, ValidationError};

/// Captures OpenAPI schemas for DTOs declared in this module
#[derive(OpenApi)]
#[openapi(components(schemas(NewTask, UpdateTask, TaskData)))]
pub struct OpenApiSchemas;

/// Rejects descriptions that are empty once surrounding whitespace is removed
fn validate_not_blank(description: &str) -> Result<(), ValidationError> {
    if description.trim().is_empty() {
        return Err(ValidationError::new("not_blank"));
    }

    Ok(())
}

/// DTO for creating a new task via the API. Deliberately has no owner field, so the
/// owner always comes from the authenticated identity no matter what the client sends.
#[derive(Deserialize, Display, Validate, ToSchema)]
#[display("{description} (completed: {completed})")]
#[cfg_attr(test, derive(Serialize))]
pub struct NewTask {
    #[validate(custom = "validate_not_blank")]
    #[schema(example = "Buy groceries")]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
}

impl From<NewTask> for domain::task::NewTask {
    fn from(value: NewTask) -> Self {
        domain::task::NewTask {
            description: value.description.trim().to_owned(),
            completed: value.completed,
        }
    }
}

/// DTO for a partial task update via the API. Keys the API does not recognize are
/// collected in [unrecognized] so the handler can reject the patch outright.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateTask {
    #[validate(custom = "validate_not_blank")]
    #[schema(example = "Buy more groceries")]
    pub description: Option<String>,
    pub completed: Option<bool>,
    #[serde(flatten)]
    #[cfg_attr(test, serde(skip_serializing))]
    #[schema(value_type = Object)]
    pub unrecognized: HashMap<String, serde_json::Value>,
}

impl From<UpdateTask> for domain::task::UpdateTask {
    fn from(value: UpdateTask) -> Self {
        domain::task::UpdateTask {
            description: value
                .description
                .map(|description| description.trim().to_owned()),
            completed: value.completed,
        }
    }
}

/// DTO for a returned task on the API
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Debug, Deserialize, PartialEq, Eq))]
pub struct TaskData {
    #[schema(example = 10)]
    pub id: i32,
    #[schema(example = "Buy groceries")]
    pub description: String,
    pub completed: bool,
    #[schema(example = 4)]
    pub owner_id: i32,
}

impl From<domain::task::Task> for TaskData {
    fn from(value: domain::task::Task) -> Self {
        TaskData {
            id: value.id,
            description: value.description,
            completed: value.completed,
            owner_id: value.owner_user_id,
        }
    }
}

/// Raw query parameters accepted by the task list endpoint. Parsing is deliberately
/// permissive, see [`From<ListTasksParams> for TaskQuery`](#impl-From<ListTasksParams>-for-TaskQuery).
#[derive(Deserialize, IntoParams)]
#[cfg_attr(test, derive(Default))]
#[into_params(parameter_in = Query)]
pub struct ListTasksParams {
    /// Filters tasks by completion state. The filter engages whenever the parameter is
    /// present; only the exact string "true" selects completed tasks.
    pub completed: Option<String>,
    /// Single-field ordering in the form `field:direction`, e.g. `description:desc`
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    /// Maximum number of tasks to return
    pub limit: Option<String>,
    /// Number of tasks to skip from the start of the result set
    pub skip: Option<String>,
}

/// Normalizes raw list parameters into a [domain::task::TaskQuery]. This conversion
/// never fails; malformed input degrades to permissive defaults. Two compatibility
/// quirks are preserved from the system this API replaces:
///
/// * `completed` filters whenever the key is present, and any value other than the
///   literal `"true"` (including `"false"`) selects incomplete tasks.
/// * The `sortBy` field name is passed through unvalidated; the store decides whether
///   it can sort by it.
impl From<ListTasksParams> for domain::task::TaskQuery {
    fn from(value: ListTasksParams) -> Self {
        let completed = value.completed.map(|raw| raw == "true");

        let sort = value.sort_by.map(|raw| match raw.split_once(':') {
            Some((field, "desc")) => domain::task::TaskSort {
                field: field.to_owned(),
                direction: domain::task::SortDirection::Descending,
            },
            Some((field, _)) => domain::task::TaskSort {
                field: field.to_owned(),
                direction: domain::task::SortDirection::Ascending,
            },
            None => domain::task::TaskSort {
                field: raw,
                direction: domain::task::SortDirection::Ascending,
            },
        });

        domain::task::TaskQuery {
            completed,
            sort,
            limit: value.limit.and_then(|raw| raw.parse().ok()),
            offset: value.skip.and_then(|raw| raw.parse().ok()),
        }
    }
}
