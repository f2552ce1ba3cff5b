use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::applications::lifecycle::Transition;
use crate::errors::AppError;
use crate::models::application::{ApplicationRow, StatusHistoryRow};
use crate::models::intent::{PrefillIntentRow, PrefillLogRow};
use crate::models::packet::{PacketRow, ProfileRow};
use crate::store::{ApplicationFilter, ReportCommit, Store};

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Status UPDATE plus history INSERT. History is append-only: never UPDATE it.
async fn write_transition(conn: &mut PgConnection, t: &Transition) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE applications SET
            status = $2,
            updated_at = $3,
            applied_at = CASE WHEN $2 = 'applied' AND applied_at IS NULL THEN $3 ELSE applied_at END,
            prefill_intent_id = COALESCE($4, prefill_intent_id)
        WHERE id = $1
        "#,
    )
    .bind(t.application_id)
    .bind(t.status.as_str())
    .bind(t.at)
    .bind(t.intent_id)
    .execute(&mut *conn)
    .await?;

    let row = t.history_row();
    insert_history(conn, &row).await
}

async fn insert_history(conn: &mut PgConnection, row: &StatusHistoryRow) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO application_status_history (id, application_id, status, note, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(row.id)
    .bind(row.application_id)
    .bind(&row.status)
    .bind(&row.note)
    .bind(row.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

#[async_trait]
impl Store for PgStore {
    async fn get_profile(&self) -> Result<Option<ProfileRow>, AppError> {
        Ok(
            sqlx::query_as::<_, ProfileRow>("SELECT * FROM profiles ORDER BY id LIMIT 1")
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn get_packet(&self, packet_id: Uuid) -> Result<Option<PacketRow>, AppError> {
        Ok(
            sqlx::query_as::<_, PacketRow>("SELECT * FROM packets WHERE id = $1")
                .bind(packet_id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn find_application_for_packet(
        &self,
        packet_id: Uuid,
    ) -> Result<Option<ApplicationRow>, AppError> {
        Ok(sqlx::query_as::<_, ApplicationRow>(
            "SELECT * FROM applications WHERE packet_id = $1 ORDER BY created_at LIMIT 1",
        )
        .bind(packet_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn insert_application(
        &self,
        app: &ApplicationRow,
        initial: &StatusHistoryRow,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO applications
                (id, job_id, packet_id, profile_id, job_title, company_name, job_url,
                 status, prefill_intent_id, prefill_log_id, last_prefill_at, notes,
                 applied_at, deadline, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(app.id)
        .bind(app.job_id)
        .bind(app.packet_id)
        .bind(app.profile_id)
        .bind(&app.job_title)
        .bind(&app.company_name)
        .bind(&app.job_url)
        .bind(&app.status)
        .bind(app.prefill_intent_id)
        .bind(app.prefill_log_id)
        .bind(app.last_prefill_at)
        .bind(&app.notes)
        .bind(app.applied_at)
        .bind(app.deadline)
        .bind(app.created_at)
        .bind(app.updated_at)
        .execute(&mut *tx)
        .await?;
        insert_history(&mut tx, initial).await?;
        tx.commit().await?;

        info!("Created application {} for packet {}", app.id, app.packet_id);
        Ok(())
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRow>, AppError> {
        Ok(
            sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<ApplicationRow>, AppError> {
        Ok(sqlx::query_as::<_, ApplicationRow>(
            r#"
            SELECT * FROM applications
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY updated_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.limit)
        .bind(filter.skip)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn status_history(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<StatusHistoryRow>, AppError> {
        Ok(sqlx::query_as::<_, StatusHistoryRow>(
            r#"
            SELECT id, application_id, status, note, created_at
            FROM application_status_history
            WHERE application_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn apply_transition(&self, transition: &Transition) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        write_transition(&mut tx, transition).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn insert_intent(
        &self,
        intent: &PrefillIntentRow,
        transition: &Transition,
    ) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO prefill_intents
                (id, application_id, packet_id, job_url, user_fields, attachments,
                 token_hash, token_expires_at, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(intent.id)
        .bind(intent.application_id)
        .bind(intent.packet_id)
        .bind(&intent.job_url)
        .bind(&intent.user_fields)
        .bind(&intent.attachments)
        .bind(&intent.token_hash)
        .bind(intent.token_expires_at)
        .bind(&intent.status)
        .bind(intent.created_at)
        .execute(&mut *tx)
        .await?;
        write_transition(&mut tx, transition).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn get_intent(&self, id: Uuid) -> Result<Option<PrefillIntentRow>, AppError> {
        Ok(
            sqlx::query_as::<_, PrefillIntentRow>("SELECT * FROM prefill_intents WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }

    async fn commit_report(&self, commit: &ReportCommit) -> Result<bool, AppError> {
        let mut tx = self.pool.begin().await?;

        // The status guard is what makes a second report lose.
        let closed = sqlx::query(
            "UPDATE prefill_intents SET status = $2 WHERE id = $1 AND status = 'pending'",
        )
        .bind(commit.intent_id)
        .bind(commit.intent_status.as_str())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if closed == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let log = &commit.log;
        sqlx::query(
            r#"
            INSERT INTO prefill_logs
                (id, intent_id, application_id, detected_ats, detection_confidence,
                 stopped_before_submit, log, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(log.id)
        .bind(log.intent_id)
        .bind(log.application_id)
        .bind(&log.detected_ats)
        .bind(log.detection_confidence)
        .bind(log.stopped_before_submit)
        .bind(&log.log)
        .bind(log.created_at)
        .execute(&mut *tx)
        .await?;

        if commit.link_application {
            sqlx::query(
                r#"
                UPDATE applications
                SET prefill_log_id = $2, last_prefill_at = $3, updated_at = $3
                WHERE id = $1
                "#,
            )
            .bind(log.application_id)
            .bind(log.id)
            .bind(log.created_at)
            .execute(&mut *tx)
            .await?;
        }

        for transition in &commit.transitions {
            write_transition(&mut tx, transition).await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn expire_intents(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        Ok(sqlx::query(
            r#"
            UPDATE prefill_intents SET status = 'expired'
            WHERE status = 'pending' AND token_expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(&self.pool)
        .await?
        .rows_affected())
    }

    async fn get_log(&self, id: Uuid) -> Result<Option<PrefillLogRow>, AppError> {
        Ok(
            sqlx::query_as::<_, PrefillLogRow>("SELECT * FROM prefill_logs WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?,
        )
    }
}
