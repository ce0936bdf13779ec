//! Handlers for the convert wizard.
//!
//! `start` returns the form with the end date pre-filled, `convert`
//! applies the conversion with the confirmed end date, and `cancel`
//! finishes without touching any record.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use salesdesk_core::convert_wizard::{self, ConvertForm, WizardButton, WizardStep};
use salesdesk_core::error::CoreError;
use salesdesk_db::models::opportunity::{OpportunityIds, OpportunityWithDuration};
use salesdesk_db::repositories::OpportunityRepo;

use crate::clock;
use crate::error::{AppError, AppResult};
use crate::handlers::opportunity::run_transition;
use crate::response::DataResponse;
use crate::state::AppState;

/// The start form and the buttons offered on it.
#[derive(Debug, Serialize)]
pub struct WizardStartResponse {
    pub step: WizardStep,
    pub form: ConvertForm,
    pub buttons: [WizardButton; 2],
}

/// Outcome of a finished wizard run.
#[derive(Debug, Serialize)]
pub struct WizardEndResponse {
    pub step: WizardStep,
    pub opportunities: Vec<OpportunityWithDuration>,
}

// ---------------------------------------------------------------------------
// POST /opportunities/convert-wizard/start
// ---------------------------------------------------------------------------

pub async fn start(
    State(state): State<AppState>,
    Json(input): Json<OpportunityIds>,
) -> AppResult<impl IntoResponse> {
    let form = convert_wizard::start(&input.ids, clock::today())?;

    let rows = OpportunityRepo::find_by_ids(&state.pool, &form.ids).await?;
    if let Some(missing) = form.ids.iter().find(|id| !rows.iter().any(|r| r.id == **id)) {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Opportunity",
            id: *missing,
        }));
    }

    Ok(Json(DataResponse {
        data: WizardStartResponse {
            step: WizardStep::Start,
            form,
            buttons: [WizardButton::Cancel, WizardButton::Convert],
        },
    }))
}

// ---------------------------------------------------------------------------
// POST /opportunities/convert-wizard/convert
// ---------------------------------------------------------------------------

pub async fn convert(
    State(state): State<AppState>,
    Json(form): Json<ConvertForm>,
) -> AppResult<impl IntoResponse> {
    let (ids, transition) = convert_wizard::confirm(&form)?;
    let opportunities = run_transition(&state.pool, &ids, transition).await?;

    tracing::info!(opportunity_ids = ?ids, "Convert wizard completed");

    Ok(Json(DataResponse {
        data: WizardEndResponse {
            step: WizardStep::End,
            opportunities,
        },
    }))
}

// ---------------------------------------------------------------------------
// POST /opportunities/convert-wizard/cancel
// ---------------------------------------------------------------------------

pub async fn cancel() -> impl IntoResponse {
    Json(DataResponse {
        data: WizardEndResponse {
            step: WizardButton::Cancel.next_step(),
            opportunities: Vec::new(),
        },
    })
}
