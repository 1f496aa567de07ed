use crate::domain::repository::TodoRepository;
use crate::domain::todo::{CreateTodo, Todo, TodoId, UpdateResult};
use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;

/// Operations behind the HTTP routes. Lookups return `None` when the id is unknown.
#[async_trait]
pub trait TodoService: Send + Sync + 'static {
    async fn create(&self, input: CreateTodo) -> Result<Todo>;
    async fn list(&self) -> Result<Vec<Todo>>;
    async fn remove(&self, id: TodoId) -> Result<Option<Todo>>;
    async fn complete(&self, ids: Vec<TodoId>) -> Result<UpdateResult>;
    async fn update_text(&self, keyword: &str, new_text: String) -> Result<UpdateResult>;
    async fn edit(&self, id: TodoId, text: String) -> Result<Option<Todo>>;
}

#[derive(Clone)]
pub struct TodoServiceImpl<R: TodoRepository> {
    repo: R,
}

impl<R: TodoRepository> TodoServiceImpl<R> {
    pub fn new(repo: R) -> Self { Self { repo } }
}

#[async_trait]
impl<R: TodoRepository> TodoService for TodoServiceImpl<R> {
    async fn create(&self, input: CreateTodo) -> Result<Todo> { self.repo.create(input).await }

    async fn list(&self) -> Result<Vec<Todo>> { self.repo.list().await }

    async fn remove(&self, id: TodoId) -> Result<Option<Todo>> {
        let Some(todo) = self.repo.get(id).await? else { return Ok(None) };
        // Another request may have removed it since the lookup.
        if !self.repo.delete(id).await? {
            return Ok(None);
        }
        Ok(Some(todo))
    }

    async fn complete(&self, ids: Vec<TodoId>) -> Result<UpdateResult> { self.repo.complete_many(&ids).await }

    async fn update_text(&self, keyword: &str, new_text: String) -> Result<UpdateResult> {
        // Unanchored, so an empty keyword selects every todo.
        let pattern = Regex::new(&format!("(?i){keyword}"))
            .with_context(|| format!("invalid keyword pattern {keyword:?}"))?;
        let result = self.repo.update_text_matching(&pattern, &new_text).await?;
        tracing::debug!(keyword, matched = result.matched, "rewrote todo text");
        Ok(result)
    }

    async fn edit(&self, id: TodoId, text: String) -> Result<Option<Todo>> {
        let Some(mut todo) = self.repo.get(id).await? else { return Ok(None) };
        todo.text = text;
        self.repo.save(todo).await.map(Some)
    }
}
