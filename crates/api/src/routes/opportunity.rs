//! Route definitions for opportunities and the convert wizard.
//!
//! Mounted at `/opportunities` by `api_routes()`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{convert_wizard, opportunity};
use crate::state::AppState;

/// Opportunity routes.
///
/// ```text
/// POST   /                          -> create_opportunity
/// GET    /                          -> list_opportunities
/// GET    /monthly                   -> get_monthly
/// POST   /durations                 -> get_durations
/// POST   /on-change                 -> evaluate_on_change
/// POST   /convert                   -> convert_opportunities
/// POST   /lost                      -> mark_lost
/// POST   /reset                     -> reset_to_draft
/// POST   /convert-wizard/start      -> convert_wizard::start
/// POST   /convert-wizard/convert    -> convert_wizard::convert
/// POST   /convert-wizard/cancel     -> convert_wizard::cancel
/// GET    /{id}                      -> get_opportunity
/// PUT    /{id}                      -> update_opportunity
/// DELETE /{id}                      -> delete_opportunity
/// GET    /{id}/field-states         -> get_field_states
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(opportunity::create_opportunity).get(opportunity::list_opportunities),
        )
        .route("/monthly", get(opportunity::get_monthly))
        .route("/durations", post(opportunity::get_durations))
        .route("/on-change", post(opportunity::evaluate_on_change))
        .route("/convert", post(opportunity::convert_opportunities))
        .route("/lost", post(opportunity::mark_lost))
        .route("/reset", post(opportunity::reset_to_draft))
        .route("/convert-wizard/start", post(convert_wizard::start))
        .route("/convert-wizard/convert", post(convert_wizard::convert))
        .route("/convert-wizard/cancel", post(convert_wizard::cancel))
        .route(
            "/{id}",
            get(opportunity::get_opportunity)
                .put(opportunity::update_opportunity)
                .delete(opportunity::delete_opportunity),
        )
        .route("/{id}/field-states", get(opportunity::get_field_states))
}
