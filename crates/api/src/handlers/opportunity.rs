//! Handlers for opportunities: CRUD, workflow transitions, derived
//! durations, form hooks, and the monthly outcome view.
//!
//! Every write checks the domain rules in `salesdesk_core::opportunity`
//! before touching the database. Batch transitions lock their rows and
//! run in a single transaction, so a batch either moves as a whole or
//! not at all.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use salesdesk_core::error::CoreError;
use salesdesk_core::monthly::aggregate_monthly;
use salesdesk_core::on_change::{on_change, ChangedField, OpportunityForm};
use salesdesk_core::opportunity::{
    self, FieldState, OpportunityState, OpportunityValues, Transition,
};
use salesdesk_core::party::{apply_party_defaults, validate_address_owner};
use salesdesk_core::search::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use salesdesk_core::types::DbId;
use salesdesk_db::models::opportunity::{
    ConvertOpportunities, CreateOpportunity, Opportunity, OpportunityDuration,
    OpportunityIds, OpportunityListParams, OpportunityWithDuration, UpdateOpportunity,
};
use salesdesk_db::repositories::{AddressRepo, OpportunityRepo};

use crate::clock;
use crate::error::{AppError, AppResult};
use crate::handlers::party::find_party;
use crate::response::DataResponse;
use crate::state::AppState;

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Opportunity",
        id,
    })
}

/// Reject an address that does not exist or belongs to another party.
async fn ensure_address_owner(
    conn: &mut PgConnection,
    values: &OpportunityValues,
) -> AppResult<()> {
    let (Some(address_id), Some(party_id)) = (values.address_id, values.party_id) else {
        return Ok(());
    };
    let address = AddressRepo::find_by_id(&mut *conn, address_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Address",
            id: address_id,
        }))?;
    validate_address_owner(address.id, address.party_id, party_id)?;
    Ok(())
}

/// Check and apply a workflow transition to a batch of opportunities.
///
/// The rows are locked, every member is checked against the transition
/// table, and only then is the batch written. Any failure rolls back the
/// whole transaction.
pub(crate) async fn run_transition(
    pool: &PgPool,
    ids: &[DbId],
    transition: Transition,
) -> AppResult<Vec<OpportunityWithDuration>> {
    let ids = opportunity::normalize_batch_ids(ids)?;

    let mut tx = pool.begin().await?;
    let rows = OpportunityRepo::lock_by_ids(&mut *tx, &ids).await?;
    if let Some(missing) = ids.iter().find(|id| !rows.iter().any(|r| r.id == **id)) {
        return Err(not_found(*missing));
    }

    let members = rows
        .iter()
        .map(Opportunity::batch_member)
        .collect::<Result<Vec<_>, _>>()?;
    let plan = opportunity::plan_batch_transition(&members, transition, clock::today())?;

    let updated = OpportunityRepo::apply_transition(&mut *tx, &ids, &plan).await?;
    tx.commit().await?;

    tracing::info!(
        opportunity_ids = ?ids,
        operation = transition.name(),
        to = %plan.target,
        "Opportunities transitioned",
    );

    Ok(updated.into_iter().map(Into::into).collect())
}

// ---------------------------------------------------------------------------
// POST /opportunities
// ---------------------------------------------------------------------------

/// Create a draft opportunity.
///
/// Missing description and comment are filled from the party; a missing
/// start date defaults to today.
pub async fn create_opportunity(
    State(state): State<AppState>,
    Json(input): Json<CreateOpportunity>,
) -> AppResult<impl IntoResponse> {
    let party = find_party(&state, input.party_id).await?;

    let mut values = OpportunityValues {
        description: input.description,
        start_date: Some(input.start_date.unwrap_or_else(clock::today)),
        end_date: input.end_date,
        party_id: Some(party.id),
        address_id: input.address_id,
        comment: input.comment,
        state: OpportunityState::Draft,
    };
    apply_party_defaults(&mut values.description, &mut values.comment, &party.contact());
    opportunity::validate_record(&values)?;

    let mut tx = state.pool.begin().await?;
    ensure_address_owner(&mut *tx, &values).await?;
    let created = OpportunityRepo::create(&mut *tx, &values).await?;
    tx.commit().await?;

    tracing::info!(
        opportunity_id = created.id,
        party_id = created.party_id,
        "Opportunity created",
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: OpportunityWithDuration::from(created),
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /opportunities
// ---------------------------------------------------------------------------

pub async fn list_opportunities(
    State(state): State<AppState>,
    Query(params): Query<OpportunityListParams>,
) -> AppResult<impl IntoResponse> {
    if let Some(ref s) = params.state {
        OpportunityState::from_str_db(s)?;
    }

    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);

    let rows = OpportunityRepo::list_filtered(
        &state.pool,
        params.state.as_deref(),
        params.party_id,
        limit,
        offset,
    )
    .await?;

    let data: Vec<OpportunityWithDuration> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// GET /opportunities/{id}
// ---------------------------------------------------------------------------

pub async fn get_opportunity(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let row = OpportunityRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(DataResponse {
        data: OpportunityWithDuration::from(row),
    }))
}

// ---------------------------------------------------------------------------
// PUT /opportunities/{id}
// ---------------------------------------------------------------------------

/// Edit an opportunity's fields.
///
/// Outside `draft`, only the end date may change. The merged record must
/// still pass every validation rule.
pub async fn update_opportunity(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateOpportunity>,
) -> AppResult<impl IntoResponse> {
    if let Some(party_id) = input.party_id {
        find_party(&state, party_id).await?;
    }

    let mut tx = state.pool.begin().await?;
    let current = OpportunityRepo::lock_by_ids(&mut *tx, &[id])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| not_found(id))?;

    opportunity::validate_edit(current.state()?, &input.changed_fields())?;
    let values = input.apply_to(current.values()?);
    opportunity::validate_record(&values)?;
    ensure_address_owner(&mut *tx, &values).await?;

    let updated = OpportunityRepo::update(&mut *tx, id, &values)
        .await?
        .ok_or_else(|| not_found(id))?;
    tx.commit().await?;

    tracing::info!(opportunity_id = id, "Opportunity updated");

    Ok(Json(DataResponse {
        data: OpportunityWithDuration::from(updated),
    }))
}

// ---------------------------------------------------------------------------
// DELETE /opportunities/{id}
// ---------------------------------------------------------------------------

pub async fn delete_opportunity(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    if !OpportunityRepo::delete(&state.pool, id).await? {
        return Err(not_found(id));
    }
    tracing::info!(opportunity_id = id, "Opportunity deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// GET /opportunities/{id}/field-states
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct FieldStatesResponse {
    pub state: OpportunityState,
    pub fields: Vec<FieldState>,
}

/// Read-only and required flags of each field for the record's state.
pub async fn get_field_states(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let row = OpportunityRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| not_found(id))?;
    let current = row.state()?;
    Ok(Json(DataResponse {
        data: FieldStatesResponse {
            state: current,
            fields: opportunity::field_states(current),
        },
    }))
}

// ---------------------------------------------------------------------------
// POST /opportunities/convert | /lost | /reset
// ---------------------------------------------------------------------------

/// Convert draft opportunities, setting the end date (default today).
pub async fn convert_opportunities(
    State(state): State<AppState>,
    Json(input): Json<ConvertOpportunities>,
) -> AppResult<impl IntoResponse> {
    let data = run_transition(
        &state.pool,
        &input.ids,
        Transition::Convert {
            end_date: input.end_date,
        },
    )
    .await?;
    Ok(Json(DataResponse { data }))
}

/// Mark draft opportunities as lost, clearing their end date.
pub async fn mark_lost(
    State(state): State<AppState>,
    Json(input): Json<OpportunityIds>,
) -> AppResult<impl IntoResponse> {
    let data = run_transition(&state.pool, &input.ids, Transition::Lost).await?;
    Ok(Json(DataResponse { data }))
}

/// Return converted or lost opportunities to draft.
pub async fn reset_to_draft(
    State(state): State<AppState>,
    Json(input): Json<OpportunityIds>,
) -> AppResult<impl IntoResponse> {
    let data = run_transition(&state.pool, &input.ids, Transition::Reset).await?;
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// POST /opportunities/durations
// ---------------------------------------------------------------------------

/// Derived duration of each requested opportunity, in request order.
pub async fn get_durations(
    State(state): State<AppState>,
    Json(input): Json<OpportunityIds>,
) -> AppResult<impl IntoResponse> {
    let ids = opportunity::normalize_batch_ids(&input.ids)?;
    let rows = OpportunityRepo::find_by_ids(&state.pool, &ids).await?;

    let data = ids
        .iter()
        .map(|id| {
            rows.iter()
                .find(|r| r.id == *id)
                .map(|r| OpportunityDuration {
                    id: r.id,
                    duration_days: r.duration_days(),
                })
                .ok_or_else(|| not_found(*id))
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// GET /opportunities/monthly
// ---------------------------------------------------------------------------

/// Converted and lost counts per month, computed from the live rows.
pub async fn get_monthly(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let outcomes = OpportunityRepo::terminal_outcomes(&state.pool)
        .await?
        .into_iter()
        .map(|o| Ok((OpportunityState::from_str_db(&o.state)?, o.end_date)))
        .collect::<Result<Vec<_>, CoreError>>()?;

    Ok(Json(DataResponse {
        data: aggregate_monthly(outcomes),
    }))
}

// ---------------------------------------------------------------------------
// POST /opportunities/on-change
// ---------------------------------------------------------------------------

/// Body of the on-change hook.
#[derive(Debug, Deserialize)]
pub struct OnChangeRequest {
    pub field: ChangedField,
    /// The selected party, when `field` is `party`.
    pub party_id: Option<DbId>,
    #[serde(default)]
    pub form: OpportunityForm,
}

/// Evaluate the form suggestion for the field that just changed.
pub async fn evaluate_on_change(
    State(state): State<AppState>,
    Json(input): Json<OnChangeRequest>,
) -> AppResult<impl IntoResponse> {
    let party = match (input.field, input.party_id) {
        (ChangedField::Party, Some(party_id)) => Some(find_party(&state, party_id).await?),
        _ => None,
    };
    let contact = party.as_ref().map(|p| p.contact());

    let result = on_change(input.form, input.field, contact.as_ref());
    Ok(Json(DataResponse { data: result }))
}
