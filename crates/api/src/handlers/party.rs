//! Handlers for parties, their addresses, and their opportunities.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use validator::Validate;

use salesdesk_core::error::CoreError;
use salesdesk_core::search::{clamp_limit, clamp_offset, DEFAULT_LIMIT, MAX_LIMIT};
use salesdesk_core::types::DbId;
use salesdesk_db::models::address::CreateAddress;
use salesdesk_db::models::opportunity::OpportunityWithDuration;
use salesdesk_db::models::party::{CreateParty, Party};
use salesdesk_db::repositories::{AddressRepo, OpportunityRepo, PartyRepo};

use crate::error::{AppError, AppResult};
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Load a party or fail with 404.
pub(crate) async fn find_party(state: &AppState, id: DbId) -> AppResult<Party> {
    PartyRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "Party", id }))
}

// ---------------------------------------------------------------------------
// POST /parties
// ---------------------------------------------------------------------------

pub async fn create_party(
    State(state): State<AppState>,
    Json(input): Json<CreateParty>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;

    let party = PartyRepo::create(&state.pool, &input).await?;
    tracing::info!(party_id = party.id, "Party created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: party })))
}

// ---------------------------------------------------------------------------
// GET /parties
// ---------------------------------------------------------------------------

pub async fn list_parties(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_LIMIT, MAX_LIMIT);
    let offset = clamp_offset(params.offset);

    let parties = PartyRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse { data: parties }))
}

// ---------------------------------------------------------------------------
// GET /parties/{id}
// ---------------------------------------------------------------------------

pub async fn get_party(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let party = find_party(&state, id).await?;
    Ok(Json(DataResponse { data: party }))
}

// ---------------------------------------------------------------------------
// POST /parties/{id}/addresses
// ---------------------------------------------------------------------------

pub async fn create_address(
    State(state): State<AppState>,
    Path(party_id): Path<DbId>,
    Json(input): Json<CreateAddress>,
) -> AppResult<impl IntoResponse> {
    input.validate()?;
    find_party(&state, party_id).await?;

    let address = AddressRepo::create(&state.pool, party_id, &input).await?;
    tracing::info!(address_id = address.id, party_id, "Address created");

    Ok((StatusCode::CREATED, Json(DataResponse { data: address })))
}

// ---------------------------------------------------------------------------
// GET /parties/{id}/addresses
// ---------------------------------------------------------------------------

pub async fn list_addresses(
    State(state): State<AppState>,
    Path(party_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_party(&state, party_id).await?;
    let addresses = AddressRepo::list_by_party(&state.pool, party_id).await?;
    Ok(Json(DataResponse { data: addresses }))
}

// ---------------------------------------------------------------------------
// GET /parties/{id}/opportunities
// ---------------------------------------------------------------------------

/// Reverse lookup: every opportunity that references the party.
pub async fn list_party_opportunities(
    State(state): State<AppState>,
    Path(party_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    find_party(&state, party_id).await?;
    let rows = OpportunityRepo::list_by_party(&state.pool, party_id).await?;
    let data: Vec<OpportunityWithDuration> = rows.into_iter().map(Into::into).collect();
    Ok(Json(DataResponse { data }))
}
