use async_trait::async_trait;
use regex::Regex;

use super::todo::{CreateTodo, Todo, TodoId, UpdateResult};

#[async_trait]
pub trait TodoRepository: Send + Sync + 'static {
    async fn init(&self) -> anyhow::Result<()>;
    async fn create(&self, input: CreateTodo) -> anyhow::Result<Todo>;
    async fn get(&self, id: TodoId) -> anyhow::Result<Option<Todo>>;
    /// All todos in insertion order, without the version field.
    async fn list(&self) -> anyhow::Result<Vec<Todo>>;
    /// Writes back a loaded todo. Fails if it no longer exists.
    async fn save(&self, todo: Todo) -> anyhow::Result<Todo>;
    async fn complete_many(&self, ids: &[TodoId]) -> anyhow::Result<UpdateResult>;
    /// Finds the todos whose text matches `pattern`, then rewrites them using the same predicate.
    async fn update_text_matching(&self, pattern: &Regex, text: &str) -> anyhow::Result<UpdateResult>;
    async fn delete(&self, id: TodoId) -> anyhow::Result<bool>;
}
