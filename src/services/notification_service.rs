use crate::error::Result;
use crate::models::webhook_log::WebhookLog;
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::Client;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{info, warn};

const WEBHOOK_LOG_COLUMNS: &str = "id, notification_id, payload, target_url, http_status, \
    response_body, attempts, max_attempts, next_retry_at, status, created_at, updated_at";

/// Delivers the `webhook_logs` outbox written next to each notification.
#[derive(Clone)]
pub struct NotificationService {
    pool: PgPool,
    client: Client,
    secret: Option<String>,
}

/// Backoff before the next attempt: 30s doubling per attempt, capped at an hour.
pub fn retry_delay(attempts: i32) -> ChronoDuration {
    let exponent = (attempts.max(1) - 1).min(16) as u32;
    let secs = 30i64.saturating_mul(2i64.pow(exponent)).min(3600);
    ChronoDuration::seconds(secs)
}

impl NotificationService {
    pub fn new(pool: PgPool, secret: Option<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self {
            pool,
            client,
            secret,
        })
    }

    /// Rows left in `delivering` by a worker that stopped mid-flight.
    pub async fn requeue_interrupted(&self) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE webhook_logs SET status = 'pending', updated_at = NOW() WHERE status = 'delivering'",
        )
        .execute(&self.pool)
        .await?;
        if result.rows_affected() > 0 {
            info!(count = result.rows_affected(), "requeued interrupted webhook deliveries");
        }
        Ok(result.rows_affected())
    }

    async fn claim_next(&self) -> Result<Option<WebhookLog>> {
        let query = format!(
            r#"UPDATE webhook_logs SET status = 'delivering', updated_at = NOW()
               WHERE id = (
                   SELECT id FROM webhook_logs
                   WHERE status = 'pending' AND (next_retry_at IS NULL OR next_retry_at <= NOW())
                   ORDER BY created_at ASC
                   FOR UPDATE SKIP LOCKED
                   LIMIT 1
               )
               RETURNING {}"#,
            WEBHOOK_LOG_COLUMNS
        );
        let row = sqlx::query_as::<_, WebhookLog>(&query)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn deliver(&self, log: &WebhookLog) -> std::result::Result<(i32, String), (Option<i32>, String)> {
        let mut request = self.client.post(&log.target_url).json(&log.payload);
        if let Some(secret) = &self.secret {
            request = request.header("X-Webhook-Secret", secret);
        }
        match request.send().await {
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                if status.is_success() {
                    Ok((status.as_u16() as i32, body))
                } else {
                    Err((Some(status.as_u16() as i32), body))
                }
            }
            Err(err) => Err((None, err.to_string())),
        }
    }

    /// Delivers at most one due outbox row. Returns whether a row was claimed.
    pub async fn run_once(&self) -> Result<bool> {
        let Some(log) = self.claim_next().await? else {
            return Ok(false);
        };

        match self.deliver(&log).await {
            Ok((http_status, body)) => {
                sqlx::query(
                    r#"UPDATE webhook_logs
                       SET status = 'success', http_status = $2, response_body = $3,
                           attempts = attempts + 1, next_retry_at = NULL, updated_at = NOW()
                       WHERE id = $1"#,
                )
                .bind(log.id)
                .bind(http_status)
                .bind(body)
                .execute(&self.pool)
                .await?;
                info!(webhook_log_id = %log.id, http_status, "webhook delivered");
            }
            Err((http_status, body)) => {
                let attempts = log.attempts + 1;
                let exhausted = attempts >= log.max_attempts;
                let next_retry_at = (!exhausted).then(|| Utc::now() + retry_delay(attempts));
                sqlx::query(
                    r#"UPDATE webhook_logs
                       SET status = $2, http_status = $3, response_body = $4,
                           attempts = $5, next_retry_at = $6, updated_at = NOW()
                       WHERE id = $1"#,
                )
                .bind(log.id)
                .bind(if exhausted { "failed" } else { "pending" })
                .bind(http_status)
                .bind(&body)
                .bind(attempts)
                .bind(next_retry_at)
                .execute(&self.pool)
                .await?;
                warn!(
                    webhook_log_id = %log.id,
                    attempts,
                    exhausted,
                    error = %body,
                    "webhook delivery failed"
                );
            }
        }
        Ok(true)
    }
}
