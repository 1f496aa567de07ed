use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use regex::Regex;
use sqlx::{
    Pool, Row, Sqlite,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
};

use crate::domain::{
    repository::TodoRepository,
    todo::{CreateTodo, Todo, TodoId, UpdateResult},
};

#[derive(Clone)]
pub struct SqliteTodoRepository {
    pool: Arc<Pool<Sqlite>>,
}

impl SqliteTodoRepository {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("parsing database url {database_url}"))?
            .with_regexp();
        // Every connection to `:memory:` opens its own database, so keep exactly one alive.
        let pool_options = if is_in_memory(database_url) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("connecting to {database_url}"))?;
        Ok(Self { pool: Arc::new(pool) })
    }
}

#[async_trait]
impl TodoRepository for SqliteTodoRepository {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS todos (
                id TEXT PRIMARY KEY,
                text TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                version INTEGER NOT NULL DEFAULT 0
            )",
        )
        .execute(&*self.pool)
        .await?;
        Ok(())
    }

    async fn create(&self, input: CreateTodo) -> Result<Todo> {
        let todo = Todo::new(input.text);
        sqlx::query("INSERT INTO todos (id, text, completed, version) VALUES (?1, ?2, ?3, ?4)")
            .bind(todo.id.to_string())
            .bind(&todo.text)
            .bind(todo.completed)
            .bind(todo.version.unwrap_or_default())
            .execute(&*self.pool)
            .await?;
        Ok(todo)
    }

    async fn get(&self, id: TodoId) -> Result<Option<Todo>> {
        let row = sqlx::query("SELECT id, text, completed, version FROM todos WHERE id = ?1")
            .bind(id.to_string())
            .fetch_optional(&*self.pool)
            .await?;
        row.as_ref().map(row_to_versioned_todo).transpose()
    }

    async fn list(&self) -> Result<Vec<Todo>> {
        let rows = sqlx::query("SELECT id, text, completed FROM todos ORDER BY rowid")
            .fetch_all(&*self.pool)
            .await?;
        rows.iter().map(row_to_todo).collect()
    }

    async fn save(&self, todo: Todo) -> Result<Todo> {
        let result = sqlx::query("UPDATE todos SET text = ?2, completed = ?3 WHERE id = ?1")
            .bind(todo.id.to_string())
            .bind(&todo.text)
            .bind(todo.completed)
            .execute(&*self.pool)
            .await?;
        if result.rows_affected() == 0 {
            bail!("no todo found with id {}", todo.id);
        }
        Ok(todo)
    }

    async fn complete_many(&self, ids: &[TodoId]) -> Result<UpdateResult> {
        // One JSON array parameter, however many ids there are.
        let ids = serde_json::to_string(ids)?;
        let mut tx = self.pool.begin().await?;

        let matched: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos WHERE id IN (SELECT value FROM json_each(?1))")
            .bind(ids.as_str())
            .fetch_one(&mut *tx)
            .await?;
        let modified = sqlx::query("UPDATE todos SET completed = 1 WHERE completed = 0 AND id IN (SELECT value FROM json_each(?1))")
            .bind(ids.as_str())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(UpdateResult { matched: matched as u64, modified })
    }

    async fn update_text_matching(&self, pattern: &Regex, text: &str) -> Result<UpdateResult> {
        let mut tx = self.pool.begin().await?;

        let matched: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todos WHERE text REGEXP ?1")
            .bind(pattern.as_str())
            .fetch_one(&mut *tx)
            .await?;
        let modified = sqlx::query("UPDATE todos SET text = ?2 WHERE text REGEXP ?1 AND text <> ?2")
            .bind(pattern.as_str())
            .bind(text)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(UpdateResult { matched: matched as u64, modified })
    }

    async fn delete(&self, id: TodoId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?1")
            .bind(id.to_string())
            .execute(&*self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Creates the database file and its parent directories for file-backed URLs,
/// since SQLite will not create them on connect.
pub fn prepare_sqlite_file(database_url: &str) -> Result<()> {
    if is_in_memory(database_url) {
        return Ok(());
    }
    if let Some(path) = database_url.strip_prefix("sqlite://") {
        let path = path.split('?').next().unwrap_or(path);
        // On Windows, absolute paths may look like /C:/path; strip the leading slash
        let path = if cfg!(windows) && path.len() >= 3 && path.as_bytes()[0] == b'/' && path.as_bytes()[2] == b':' {
            &path[1..]
        } else {
            path
        };
        use std::{fs, fs::OpenOptions, path::Path};
        let p = Path::new(path);
        if let Some(parent) = p.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if !p.exists() {
            OpenOptions::new().create(true).append(true).open(p)?;
        }
    }
    Ok(())
}

fn is_in_memory(database_url: &str) -> bool { database_url.contains(":memory:") }

fn row_to_todo(row: &SqliteRow) -> Result<Todo> {
    let id_str: String = row.try_get("id")?;
    let text: String = row.try_get("text")?;
    let completed: bool = row.try_get("completed")?;
    let id = id_str
        .parse::<TodoId>()
        .with_context(|| format!("stored todo has malformed id {id_str:?}"))?;
    Ok(Todo { id, text, completed, version: None })
}

fn row_to_versioned_todo(row: &SqliteRow) -> Result<Todo> {
    let mut todo = row_to_todo(row)?;
    todo.version = Some(row.try_get("version")?);
    Ok(todo)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Above SQLite's default limit of 32766 bound parameters per statement.
    const MANY: usize = 33_000;

    async fn repo() -> SqliteTodoRepository {
        let repo = SqliteTodoRepository::connect("sqlite::memory:").await.unwrap();
        repo.init().await.unwrap();
        repo
    }

    async fn seed_many(repo: &SqliteTodoRepository, n: usize) -> Vec<TodoId> {
        let ids: Vec<TodoId> = (0..n).map(|_| TodoId::default()).collect();
        sqlx::query("INSERT INTO todos (id, text) SELECT value, 'todo ' || key FROM json_each(?1)")
            .bind(serde_json::to_string(&ids).unwrap())
            .execute(&*repo.pool)
            .await
            .unwrap();
        ids
    }

    fn keyword(k: &str) -> Regex { Regex::new(&format!("(?i){k}")).unwrap() }

    #[tokio::test]
    async fn list_projects_out_version_and_keeps_insertion_order() {
        let repo = repo().await;
        for text in ["first", "second", "third"] {
            repo.create(CreateTodo { text: text.into() }).await.unwrap();
        }
        let todos = repo.list().await.unwrap();
        let texts: Vec<_> = todos.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
        assert!(todos.iter().all(|t| t.version.is_none()));
    }

    #[tokio::test]
    async fn complete_many_reports_matched_and_modified() {
        let repo = repo().await;
        let a = repo.create(CreateTodo { text: "a".into() }).await.unwrap();
        let b = repo.create(CreateTodo { text: "b".into() }).await.unwrap();

        let first = repo.complete_many(&[a.id, b.id, TodoId::default()]).await.unwrap();
        assert_eq!(first, UpdateResult { matched: 2, modified: 2 });

        let again = repo.complete_many(&[a.id]).await.unwrap();
        assert_eq!(again, UpdateResult { matched: 1, modified: 0 });

        let none = repo.complete_many(&[]).await.unwrap();
        assert_eq!(none, UpdateResult::default());
    }

    #[tokio::test]
    async fn update_text_matching_is_case_insensitive() {
        let repo = repo().await;
        let milk = repo.create(CreateTodo { text: "Buy MILK".into() }).await.unwrap();
        let dog = repo.create(CreateTodo { text: "walk dog".into() }).await.unwrap();

        let result = repo.update_text_matching(&keyword("milk"), "buy oat milk").await.unwrap();
        assert_eq!(result, UpdateResult { matched: 1, modified: 1 });
        assert_eq!(repo.get(milk.id).await.unwrap().unwrap().text, "buy oat milk");
        assert_eq!(repo.get(dog.id).await.unwrap().unwrap().text, "walk dog");
    }

    #[tokio::test]
    async fn bulk_updates_are_not_bounded_by_parameter_limit() {
        let repo = repo().await;
        let ids = seed_many(&repo, MANY).await;

        let completed = repo.complete_many(&ids).await.unwrap();
        assert_eq!(completed, UpdateResult { matched: MANY as u64, modified: MANY as u64 });

        let rewritten = repo.update_text_matching(&keyword(""), "x").await.unwrap();
        assert_eq!(rewritten, UpdateResult { matched: MANY as u64, modified: MANY as u64 });

        let todos = repo.list().await.unwrap();
        assert!(todos.iter().all(|t| t.completed && t.text == "x"));
    }

    #[tokio::test]
    async fn save_fails_for_missing_todo() {
        let repo = repo().await;
        let ghost = Todo::new("ghost".into());
        assert!(repo.save(ghost).await.is_err());
    }
}
