use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::applications::lifecycle::{check_user_transition, ApplicationStatus, Transition};
use crate::clock::Clock;
use crate::errors::AppError;
use crate::models::application::{ApplicationRow, StatusHistoryRow};
use crate::store::{ApplicationFilter, Store};

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub packet_id: Uuid,
    pub notes: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListApplicationsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

/// An application together with its full, ordered status history.
#[derive(Debug, Serialize)]
pub struct ApplicationView {
    #[serde(flatten)]
    pub application: ApplicationRow,
    pub status_history: Vec<StatusHistoryRow>,
}

async fn load_view(store: &dyn Store, application: ApplicationRow) -> Result<ApplicationView, AppError> {
    let status_history = store.status_history(application.id).await?;
    Ok(ApplicationView {
        application,
        status_history,
    })
}

fn parse_status(raw: &str) -> Result<ApplicationStatus, AppError> {
    raw.parse::<ApplicationStatus>()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// Creates the tracked application for a packet. Idempotent per packet: an
/// existing application is returned untouched.
pub async fn create_application(
    store: &dyn Store,
    clock: &dyn Clock,
    request: CreateApplicationRequest,
) -> Result<ApplicationView, AppError> {
    let packet = store
        .get_packet(request.packet_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Packet {} not found", request.packet_id)))?;

    if let Some(existing) = store.find_application_for_packet(packet.id).await? {
        return load_view(store, existing).await;
    }

    let profile = store
        .get_profile()
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    let now = clock.now();
    let application = ApplicationRow {
        id: Uuid::new_v4(),
        job_id: packet.job_id,
        packet_id: packet.id,
        profile_id: profile.id,
        job_title: packet.job_title,
        company_name: packet.company_name,
        job_url: packet.job_url,
        status: ApplicationStatus::Prepared.as_str().to_string(),
        prefill_intent_id: None,
        prefill_log_id: None,
        last_prefill_at: None,
        notes: request.notes.unwrap_or_default(),
        applied_at: None,
        deadline: request.deadline,
        created_at: now,
        updated_at: now,
    };
    let initial = Transition::new(
        application.id,
        ApplicationStatus::Prepared,
        "Application created",
        now,
    )
    .history_row();

    store.insert_application(&application, &initial).await?;
    Ok(ApplicationView {
        application,
        status_history: vec![initial],
    })
}

pub async fn list_applications(
    store: &dyn Store,
    query: ListApplicationsQuery,
) -> Result<Vec<ApplicationRow>, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    let skip = query.skip.unwrap_or(0);
    if skip < 0 {
        return Err(AppError::Validation("skip must not be negative".to_string()));
    }
    let status = query.status.as_deref().map(parse_status).transpose()?;

    store
        .list_applications(&ApplicationFilter {
            status,
            limit,
            skip,
        })
        .await
}

pub async fn get_application(store: &dyn Store, id: Uuid) -> Result<ApplicationView, AppError> {
    let application = store
        .get_application(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;
    load_view(store, application).await
}

/// User-initiated status change. This is the only way an application reaches
/// `applied`.
pub async fn update_status(
    store: &dyn Store,
    clock: &dyn Clock,
    id: Uuid,
    request: UpdateStatusRequest,
) -> Result<ApplicationView, AppError> {
    let target = parse_status(&request.status)?;
    check_user_transition(target).map_err(|e| AppError::Validation(e.to_string()))?;

    let application = store
        .get_application(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    let transition = Transition::new(
        application.id,
        target,
        request.note.unwrap_or_default(),
        clock.now(),
    );
    store.apply_transition(&transition).await?;

    info!(
        "Application {id} moved from {} to {} by user",
        application.status,
        target.as_str()
    );

    get_application(store, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::store::memory::seeded;

    async fn create(store: &dyn Store, packet_id: Uuid) -> ApplicationView {
        create_application(
            store,
            &SystemClock,
            CreateApplicationRequest {
                packet_id,
                notes: Some("Referred by Charles".to_string()),
                deadline: None,
            },
        )
        .await
        .unwrap()
    }

    fn status(s: &str) -> UpdateStatusRequest {
        UpdateStatusRequest {
            status: s.to_string(),
            note: Some(format!("moved to {s}")),
        }
    }

    #[tokio::test]
    async fn test_create_starts_prepared_with_one_history_entry() {
        let (store, packet) = seeded();
        let view = create(&store, packet.id).await;
        assert_eq!(view.application.status, "prepared");
        assert_eq!(view.application.job_title, packet.job_title);
        assert_eq!(view.application.notes, "Referred by Charles");
        assert_eq!(view.status_history.len(), 1);
        assert_eq!(view.status_history[0].note, "Application created");
    }

    #[tokio::test]
    async fn test_create_is_idempotent_per_packet() {
        let (store, packet) = seeded();
        let first = create(&store, packet.id).await;
        let second = create(&store, packet.id).await;
        assert_eq!(first.application.id, second.application.id);
        assert_eq!(second.status_history.len(), 1);
    }

    #[tokio::test]
    async fn test_create_unknown_packet_is_not_found() {
        let (store, _) = seeded();
        let result = create_application(
            &store,
            &SystemClock,
            CreateApplicationRequest {
                packet_id: Uuid::new_v4(),
                notes: None,
                deadline: None,
            },
        )
        .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_history_is_append_only_across_transitions() {
        let (store, packet) = seeded();
        let id = create(&store, packet.id).await.application.id;

        let mut previous = get_application(&store, id).await.unwrap().status_history;
        for next in ["applied", "interviewing", "offered", "accepted", "declined", "withdrawn"] {
            let view = update_status(&store, &SystemClock, id, status(next)).await.unwrap();
            assert_eq!(view.application.status, next);
            assert_eq!(view.status_history.len(), previous.len() + 1);
            assert_eq!(&view.status_history[..previous.len()], previous.as_slice());
            previous = view.status_history;
        }
    }

    #[tokio::test]
    async fn test_user_cannot_set_prefilled() {
        let (store, packet) = seeded();
        let id = create(&store, packet.id).await.application.id;
        let result = update_status(&store, &SystemClock, id, status("prefilled")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(get_application(&store, id).await.unwrap().status_history.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_status_is_validation_error() {
        let (store, packet) = seeded();
        let id = create(&store, packet.id).await.application.id;
        let result = update_status(&store, &SystemClock, id, status("ghosted")).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_applied_sets_applied_at() {
        let (store, packet) = seeded();
        let id = create(&store, packet.id).await.application.id;
        let view = update_status(&store, &SystemClock, id, status("applied")).await.unwrap();
        assert!(view.application.applied_at.is_some());
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let (store, packet) = seeded();
        let id = create(&store, packet.id).await.application.id;

        let prepared = list_applications(
            &store,
            ListApplicationsQuery {
                status: Some("prepared".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(prepared.len(), 1);
        assert_eq!(prepared[0].id, id);

        let applied = list_applications(
            &store,
            ListApplicationsQuery {
                status: Some("applied".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(applied.is_empty());
    }

    #[tokio::test]
    async fn test_list_rejects_out_of_range_limit() {
        let (store, _) = seeded();
        for limit in [0, 101] {
            let result = list_applications(
                &store,
                ListApplicationsQuery {
                    limit: Some(limit),
                    ..Default::default()
                },
            )
            .await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
    }
}
