use axum::{http::StatusCode, response::IntoResponse, routing::post, Json, Router};

use super::completion::ProfileCompletion;
use super::domain::UserProfile;

pub fn profile_router() -> Router {
    Router::new().route("/api/v1/profiles/completion", post(completion_handler))
}

pub(crate) async fn completion_handler(Json(profile): Json<UserProfile>) -> impl IntoResponse {
    let completion = ProfileCompletion::evaluate(&profile);
    tracing::debug!(
        role = profile.role.label(),
        percentage = completion.percentage,
        "profile completion evaluated"
    );
    (StatusCode::OK, Json(completion))
}
