use crate::external_connections::ExternalConnectivity;

/// A single unit of work owned by exactly one user. Tasks are only ever visible or
/// mutable through operations scoped to their owner.
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct Task {
    pub id: i32,
    pub owner_user_id: i32,
    pub description: String,
    pub completed: bool,
}

#[cfg_attr(test, derive(Debug, Clone))]
pub struct NewTask {
    pub description: String,
    pub completed: bool,
}

/// A partial update to a task. Fields left as [None] are untouched.
#[cfg_attr(test, derive(Debug, Clone))]
pub struct UpdateTask {
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.completed.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// A single-field ordering for a task list. The field name is not validated here;
/// stores ignore fields they cannot sort by and fall back to insertion order.
#[derive(Debug, PartialEq, Eq)]
#[cfg_attr(test, derive(Clone))]
pub struct TaskSort {
    pub field: String,
    pub direction: SortDirection,
}

/// Normalized, request-scoped filter/sort/window description for a task list.
/// Built fresh per request, never persisted.
#[derive(Debug, Default, PartialEq, Eq)]
#[cfg_attr(test, derive(Clone))]
pub struct TaskQuery {
    pub completed: Option<bool>,
    pub sort: Option<TaskSort>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

pub mod driven_ports {
    use super::*;

    pub trait TaskReader {
        /// Fetches the owner's tasks matching [query]'s filter, ordered by its sort
        /// (stable, ties broken by insertion order) and windowed by its offset/limit.
        async fn tasks_for_owner(
            &self,
            owner_user_id: i32,
            query: &TaskQuery,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, anyhow::Error>;

        async fn task_by_id(
            &self,
            owner_user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;
    }

    pub trait TaskWriter {
        async fn create_task(
            &self,
            owner_user_id: i32,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Task, anyhow::Error>;

        /// Applies the fields present in [update] to the owner's task, returning the
        /// updated record, or [None] when the owner has no task with that ID. The caller
        /// is responsible for rejecting fields outside the allowed update set.
        async fn update_task(
            &self,
            owner_user_id: i32,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;

        /// Removes the owner's task, returning the prior record, or [None] when the
        /// owner has no task with that ID.
        async fn delete_task(
            &self,
            owner_user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("a task's description cannot be blank")]
        BlankDescription,
        /// Covers both a genuinely absent task and a task owned by someone else, so
        /// callers cannot tell the two apart.
        #[error("the requested task does not exist")]
        NotFound,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait TaskPort {
        async fn create_task(
            &self,
            owner_user_id: i32,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, TaskError>;

        async fn tasks_for_owner(
            &self,
            owner_user_id: i32,
            query: &TaskQuery,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<Task>, TaskError>;

        async fn task_by_id(
            &self,
            owner_user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Task, TaskError>;

        async fn update_task(
            &self,
            owner_user_id: i32,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, TaskError>;

        async fn delete_task(
            &self,
            owner_user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, TaskError>;
    }
}

use driving_ports::TaskError;

pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    async fn create_task(
        &self,
        owner_user_id: i32,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<Task, TaskError> {
        if new_task.description.trim().is_empty() {
            return Err(TaskError::BlankDescription);
        }

        let created_task = task_write
            .create_task(owner_user_id, new_task, &mut *ext_cxn)
            .await?;
        Ok(created_task)
    }

    async fn tasks_for_owner(
        &self,
        owner_user_id: i32,
        query: &TaskQuery,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl driven_ports::TaskReader,
    ) -> Result<Vec<Task>, TaskError> {
        let tasks = task_read
            .tasks_for_owner(owner_user_id, query, &mut *ext_cxn)
            .await?;
        Ok(tasks)
    }

    async fn task_by_id(
        &self,
        owner_user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl driven_ports::TaskReader,
    ) -> Result<Task, TaskError> {
        let maybe_task = task_read
            .task_by_id(owner_user_id, task_id, &mut *ext_cxn)
            .await?;
        maybe_task.ok_or(TaskError::NotFound)
    }

    async fn update_task(
        &self,
        owner_user_id: i32,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<Task, TaskError> {
        if let Some(ref new_description) = update.description {
            if new_description.trim().is_empty() {
                return Err(TaskError::BlankDescription);
            }
        }

        let maybe_task = task_write
            .update_task(owner_user_id, task_id, update, &mut *ext_cxn)
            .await?;
        maybe_task.ok_or(TaskError::NotFound)
    }

    async fn delete_task(
        &self,
        owner_user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl driven_ports::TaskWriter,
    ) -> Result<Task, TaskError> {
        let maybe_task = task_write
            .delete_task(owner_user_id, task_id, &mut *ext_cxn)
            .await?;
        maybe_task.ok_or(TaskError::NotFound)
    }
}
