use crate::domain::task::driven_ports::{self, TaskReader};
use crate::domain::task::{NewTask, SortDirection, Task, TaskQuery, TaskSort, UpdateTask};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use sqlx::{Postgres, QueryBuilder, query_as};

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i32,
    owner_user_id: i32,
    description: String,
    completed: bool,
}

impl From<TaskRow> for Task {
    fn from(value: TaskRow) -> Self {
        Task {
            id: value.id,
            owner_user_id: value.owner_user_id,
            description: value.description,
            completed: value.completed,
        }
    }
}

const TASK_COLUMNS: &str = "id, owner_user_id, description, completed";

/// Produces the ORDER BY clause for a task list. Only fixed column names ever reach the
/// SQL text; a sort on anything other than a sortable column falls back to insertion
/// order instead of interpolating client input. The trailing `id` term keeps the order
/// stable between calls.
fn sort_clause(sort: Option<&TaskSort>) -> &'static str {
    let Some(sort) = sort else {
        return " ORDER BY id ASC";
    };

    match (sort.field.as_str(), sort.direction) {
        ("description", SortDirection::Ascending) => " ORDER BY description ASC, id ASC",
        ("description", SortDirection::Descending) => " ORDER BY description DESC, id ASC",
        ("completed", SortDirection::Ascending) => " ORDER BY completed ASC, id ASC",
        ("completed", SortDirection::Descending) => " ORDER BY completed DESC, id ASC",
        ("id", SortDirection::Ascending) => " ORDER BY id ASC",
        ("id", SortDirection::Descending) => " ORDER BY id DESC",
        _ => " ORDER BY id ASC",
    }
}

pub struct DbTaskReader;

impl driven_ports::TaskReader for DbTaskReader {
    async fn tasks_for_owner(
        &self,
        owner_user_id: i32,
        query: &TaskQuery,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Task>, Error> {
        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring a connection to list tasks")?;

        let mut list_sql = QueryBuilder::<Postgres>::new(format!(
            "SELECT {TASK_COLUMNS} FROM task WHERE owner_user_id = "
        ));
        list_sql.push_bind(owner_user_id);
        if let Some(completed) = query.completed {
            list_sql.push(" AND completed = ");
            list_sql.push_bind(completed);
        }
        list_sql.push(sort_clause(query.sort.as_ref()));
        // A zero limit means "no limit", same as an absent one
        if let Some(limit) = query.limit {
            if limit > 0 {
                list_sql.push(" LIMIT ");
                list_sql.push_bind(limit as i64);
            }
        }
        if let Some(offset) = query.offset {
            list_sql.push(" OFFSET ");
            list_sql.push_bind(offset as i64);
        }

        let tasks: Vec<Task> = list_sql
            .build_query_as::<TaskRow>()
            .fetch_all(cxn.borrow_connection())
            .await
            .context("trying to fetch an owner's tasks")?
            .into_iter()
            .map(Task::from)
            .collect();

        Ok(tasks)
    }

    async fn task_by_id(
        &self,
        owner_user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring a connection to fetch a task")?;

        let task: Option<Task> = query_as::<_, TaskRow>(
            "SELECT id, owner_user_id, description, completed FROM task \
             WHERE owner_user_id = $1 AND id = $2",
        )
        .bind(owner_user_id)
        .bind(task_id)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to fetch a task by ID")?
        .map(Task::from);

        Ok(task)
    }
}

pub struct DbTaskWriter;

impl driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task(
        &self,
        owner_user_id: i32,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Task, Error> {
        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring a connection to create a task")?;

        let stored_task: Task = query_as::<_, TaskRow>(
            "INSERT INTO task (owner_user_id, description, completed) VALUES ($1, $2, $3) \
             RETURNING id, owner_user_id, description, completed",
        )
        .bind(owner_user_id)
        .bind(&new_task.description)
        .bind(new_task.completed)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to insert a new task into the database")?
        .into();

        Ok(stored_task)
    }

    async fn update_task(
        &self,
        owner_user_id: i32,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        // A patch with no recognized fields still succeeds and produces the current
        // record, so it reads instead of writing
        if update.is_empty() {
            return DbTaskReader {}
                .task_by_id(owner_user_id, task_id, ext_cxn)
                .await;
        }

        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring a connection to update a task")?;

        // The owner scope in the WHERE clause plus single-statement execution means a
        // concurrently deleted task just fails to match and reports "not found"
        let mut update_sql = QueryBuilder::<Postgres>::new("UPDATE task SET ");
        let mut changed_fields = update_sql.separated(", ");
        if let Some(ref description) = update.description {
            changed_fields.push("description = ");
            changed_fields.push_bind_unseparated(description);
        }
        if let Some(completed) = update.completed {
            changed_fields.push("completed = ");
            changed_fields.push_bind_unseparated(completed);
        }
        update_sql.push(" WHERE owner_user_id = ");
        update_sql.push_bind(owner_user_id);
        update_sql.push(" AND id = ");
        update_sql.push_bind(task_id);
        update_sql.push(format!(" RETURNING {TASK_COLUMNS}"));

        let updated_task: Option<Task> = update_sql
            .build_query_as::<TaskRow>()
            .fetch_optional(cxn.borrow_connection())
            .await
            .context("trying to update a task in the database")?
            .map(Task::from);

        Ok(updated_task)
    }

    async fn delete_task(
        &self,
        owner_user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, Error> {
        let mut cxn = ext_cxn
            .database_cxn()
            .await
            .context("acquiring a connection to delete a task")?;

        let deleted_task: Option<Task> = query_as::<_, TaskRow>(
            "DELETE FROM task WHERE owner_user_id = $1 AND id = $2 \
             RETURNING id, owner_user_id, description, completed",
        )
        .bind(owner_user_id)
        .bind(task_id)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("trying to remove a task from the database")?
        .map(Task::from);

        Ok(deleted_task)
    }
}
