use async_trait::async_trait;
use uuid::Uuid;

use super::PgStore;
use crate::error::Result;
use crate::models::department::Department;
use crate::models::user::{NewUser, User};
use crate::workflow::Role;

/// Users and departments: the identity/role lookup the workflow reads.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn list_users(&self) -> Result<Vec<User>>;

    async fn create_department(&self, name: String) -> Result<Department>;

    async fn get_department(&self, id: Uuid) -> Result<Option<Department>>;

    async fn list_departments(&self) -> Result<Vec<Department>>;

    /// Canonical role of an active user; `None` for unknown or inactive ids.
    async fn actor_role(&self, user_id: Uuid) -> Result<Option<Role>> {
        let user = self.get_user(user_id).await?;
        Ok(user
            .filter(|u| u.is_active)
            .map(|u| u.workflow_role()))
    }
}

#[async_trait]
impl DirectoryRepository for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, role)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, role, is_active, created_at, updated_at
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.role)
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, User>(
            "SELECT id, name, email, role, is_active, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, User>(
            "SELECT id, name, email, role, is_active, created_at, updated_at FROM users ORDER BY name",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }

    async fn create_department(&self, name: String) -> Result<Department> {
        let row = sqlx::query_as::<_, Department>(
            "INSERT INTO departments (name) VALUES ($1) RETURNING id, name, created_at",
        )
        .bind(&name)
        .fetch_one(self.pool())
        .await?;
        Ok(row)
    }

    async fn get_department(&self, id: Uuid) -> Result<Option<Department>> {
        let row = sqlx::query_as::<_, Department>(
            "SELECT id, name, created_at FROM departments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    async fn list_departments(&self) -> Result<Vec<Department>> {
        let rows = sqlx::query_as::<_, Department>(
            "SELECT id, name, created_at FROM departments ORDER BY name",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
