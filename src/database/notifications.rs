use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

use super::PgStore;
use crate::error::Result;
use crate::models::notification::{Notification, NotificationEvent};

const NOTIFICATION_COLUMNS: &str =
    "id, sender_id, receiver_id, hiring_request_id, message, read_at, created_at";

/// Where the workflow hands its events. Callers treat failures as best-effort.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn emit(&self, event: NotificationEvent) -> Result<()>;
}

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn list_notifications(
        &self,
        receiver_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>>;

    async fn unread_count(&self, receiver_id: Uuid) -> Result<i64>;

    /// Marks a notification as read; only its receiver may do so.
    async fn mark_read(&self, id: Uuid, receiver_id: Uuid) -> Result<Notification>;
}

#[async_trait]
impl NotificationSink for PgStore {
    async fn emit(&self, event: NotificationEvent) -> Result<()> {
        let mut tx = self.pool().begin().await?;

        let notification_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO notifications (sender_id, receiver_id, hiring_request_id, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(event.sender_id)
        .bind(event.receiver_id)
        .bind(event.hiring_request_id)
        .bind(&event.message)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(target_url) = &self.webhook_target {
            let payload = json!({
                "event": "hiring_request.transition",
                "notification_id": notification_id,
                "sender_id": event.sender_id,
                "receiver_id": event.receiver_id,
                "hiring_request_id": event.hiring_request_id,
                "message": event.message,
            });
            sqlx::query(
                r#"
                INSERT INTO webhook_logs (notification_id, payload, target_url, status)
                VALUES ($1, $2, $3, 'pending')
                "#,
            )
            .bind(notification_id)
            .bind(&payload)
            .bind(target_url)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationRepository for PgStore {
    async fn list_notifications(
        &self,
        receiver_id: Uuid,
        unread_only: bool,
    ) -> Result<Vec<Notification>> {
        let query = format!(
            "SELECT {} FROM notifications
             WHERE receiver_id = $1 AND ($2 = FALSE OR read_at IS NULL)
             ORDER BY created_at DESC
             LIMIT 200",
            NOTIFICATION_COLUMNS
        );
        let rows = sqlx::query_as::<_, Notification>(&query)
            .bind(receiver_id)
            .bind(unread_only)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    async fn unread_count(&self, receiver_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE receiver_id = $1 AND read_at IS NULL",
        )
        .bind(receiver_id)
        .fetch_one(self.pool())
        .await?;
        Ok(count)
    }

    async fn mark_read(&self, id: Uuid, receiver_id: Uuid) -> Result<Notification> {
        let query = format!(
            "UPDATE notifications SET read_at = COALESCE(read_at, NOW())
             WHERE id = $1 AND receiver_id = $2
             RETURNING {}",
            NOTIFICATION_COLUMNS
        );
        let row = sqlx::query_as::<_, Notification>(&query)
            .bind(id)
            .bind(receiver_id)
            .fetch_one(self.pool())
            .await?;
        Ok(row)
    }
}
