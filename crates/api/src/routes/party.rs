//! Route definitions for parties.
//!
//! Mounted at `/parties` by `api_routes()`.

use axum::routing::get;
use axum::Router;

use crate::handlers::party;
use crate::state::AppState;

/// Party routes.
///
/// ```text
/// POST   /                       -> create_party
/// GET    /                       -> list_parties
/// GET    /{id}                   -> get_party
/// POST   /{id}/addresses         -> create_address
/// GET    /{id}/addresses         -> list_addresses
/// GET    /{id}/opportunities     -> list_party_opportunities
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(party::list_parties).post(party::create_party))
        .route("/{id}", get(party::get_party))
        .route(
            "/{id}/addresses",
            get(party::list_addresses).post(party::create_address),
        )
        .route("/{id}/opportunities", get(party::list_party_opportunities))
}
