pub mod health;
pub mod opportunity;
pub mod party;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /parties                                          list, create
/// /parties/{id}                                     get
/// /parties/{id}/addresses                           list, create
/// /parties/{id}/opportunities                       reverse lookup
///
/// /opportunities                                    list, create
/// /opportunities/monthly                            monthly outcome view
/// /opportunities/durations                          derived durations (POST)
/// /opportunities/on-change                          form suggestion hooks (POST)
/// /opportunities/convert                            draft -> converted (POST)
/// /opportunities/lost                               draft -> lost (POST)
/// /opportunities/reset                              converted|lost -> draft (POST)
/// /opportunities/convert-wizard/start               wizard start form (POST)
/// /opportunities/convert-wizard/convert             wizard confirm (POST)
/// /opportunities/convert-wizard/cancel              wizard cancel (POST)
/// /opportunities/{id}                               get, update, delete
/// /opportunities/{id}/field-states                  per-field access flags
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/parties", party::router())
        .nest("/opportunities", opportunity::router())
}
