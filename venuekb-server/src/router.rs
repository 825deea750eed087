use serde_json::json;
use venuekb_core::ipc::{KbRequest, KbResponse};
use venuekb_core::StoreError;
use venuekb_ingest::{progress_report, review, IngestError};

use crate::AppState;

pub async fn handle_request(request: KbRequest, state: &AppState) -> KbResponse {
    match request {
        KbRequest::Ping => KbResponse::pong(),
        request => match dispatch(request, state).await {
            Ok(data) => KbResponse::ok(data),
            Err(e) => KbResponse::err(e.to_string()),
        },
    }
}

/// Run one request against the pipeline and store.
///
/// Typed errors are kept so HTTP callers can pick a status code.
pub async fn dispatch(
    request: KbRequest,
    state: &AppState,
) -> Result<serde_json::Value, IngestError> {
    match request {
        KbRequest::Ping => Ok(json!({"pong": true})),
        KbRequest::Health => {
            let pg_ver = venuekb_core::db::health_check(&state.pool)
                .await
                .map_err(StoreError::from)?;
            let entries = venuekb_core::db::count_knowledge_entries(&state.pool)
                .await
                .map_err(StoreError::from)?;
            Ok(json!({
                "postgresql": pg_ver,
                "knowledge_entries": entries,
                "model": state.pipeline.model_name(),
                "status": "healthy"
            }))
        }
        KbRequest::Extract {
            venue_id,
            transcript,
            pass,
        } => {
            let report = state.pipeline.run_pass(venue_id, &transcript, &pass).await?;
            Ok(json!({
                "venue_id": venue_id,
                "pass": pass,
                "report": report,
            }))
        }
        KbRequest::ExtractAll {
            venue_id,
            transcript,
        } => {
            let result = state.pipeline.run_transcript(venue_id, &transcript).await?;
            Ok(json!({
                "venue_id": venue_id,
                "passes": result.passes,
                "totals": result.totals,
            }))
        }
        KbRequest::Onboarding {
            venue_id,
            answers,
            replace_existing,
        } => {
            let report = state
                .pipeline
                .run_onboarding(venue_id, &answers, replace_existing)
                .await?;
            Ok(json!({
                "venue_id": venue_id,
                "report": report,
            }))
        }
        KbRequest::Pending { venue_id } => {
            let pending = review::list_pending(state.store(), venue_id).await?;
            Ok(json!({
                "venue_id": venue_id,
                "count": pending.len(),
                "entries": pending,
            }))
        }
        KbRequest::Review { id, decision } => {
            let outcome = review::apply(state.store(), id, decision).await?;
            Ok(serde_json::to_value(outcome).unwrap_or_else(|_| json!({"id": id})))
        }
        KbRequest::Progress { venue_id, sections } => {
            let active = state.store().list_active(venue_id).await?;
            let report = progress_report(&active, &sections);
            Ok(json!({
                "venue_id": venue_id,
                "score": report.score,
                "sections": report.sections,
            }))
        }
    }
}
