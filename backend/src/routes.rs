use rocket::{
    State, get, post,
    form::Form,
    http::uri::{Segments, fmt::Path},
    response::{Redirect, content::RawHtml},
    serde::json::Json,
};
use tally_shared::{HealthResponse, SyncStats, Tally, VoteForm, VoteOutcome, VoteResponse, RESET_VOTE};
use tracing::{debug, instrument};

use crate::{error::ApiError, tally::TallySynchronizer, views::render_index};

pub struct AppState {
    pub title: String,
    pub tally: TallySynchronizer,
}

impl AppState {
    pub fn new(title: impl Into<String>, tally: TallySynchronizer) -> Self {
        Self {
            title: title.into(),
            tally,
        }
    }

    /// Shared dispatch for form and API submissions. `None` means the vote was
    /// for an unknown choice and nothing was counted.
    async fn submit(&self, vote: &str) -> Option<VoteOutcome> {
        if vote == RESET_VOTE {
            self.tally.reset_all().await;
            return Some(VoteOutcome::Reset);
        }

        self.tally
            .record_vote(vote)
            .await
            .then_some(VoteOutcome::Accepted)
    }
}

#[get("/")]
pub async fn index(state: &State<AppState>) -> Result<RawHtml<String>, ApiError> {
    let tally = state.tally.refresh_all().await;
    Ok(RawHtml(render_index(&state.title, &tally)?))
}

/// Form submissions always redirect back to the page, counted or not.
#[instrument(skip(state, form), fields(vote = %form.vote))]
#[post("/", data = "<form>")]
pub async fn submit_form(state: &State<AppState>, form: Form<VoteForm>) -> Redirect {
    let outcome = state.submit(&form.vote).await;
    debug!(?outcome, "form vote handled");
    Redirect::to("/")
}

/// Liveness answer for `/api` and `/api/`. Anything deeper that no other
/// route claims is a 404.
#[get("/<rest..>", rank = 20)]
pub async fn health(rest: Segments<'_, Path>) -> Option<Json<HealthResponse>> {
    rest.is_empty().then(|| Json(HealthResponse::pong()))
}

#[get("/tally")]
pub async fn get_tally(state: &State<AppState>) -> Json<Tally> {
    Json(state.tally.refresh_all().await)
}

#[instrument(skip(state, request), fields(vote = %request.vote))]
#[post("/vote", format = "json", data = "<request>")]
pub async fn cast_vote(
    state: &State<AppState>,
    request: Json<VoteForm>,
) -> Result<Json<VoteResponse>, ApiError> {
    let VoteForm { vote } = request.into_inner();
    let outcome = state
        .submit(&vote)
        .await
        .ok_or(ApiError::UnknownChoice(vote))?;

    Ok(Json(VoteResponse {
        outcome,
        tally: state.tally.refresh_all().await,
    }))
}

#[get("/stats")]
pub async fn get_stats(state: &State<AppState>) -> Json<SyncStats> {
    Json(state.tally.stats())
}
