use axum::{extract::State, response::Json};

use crate::{
    AppState,
    auth::AuthUser,
    error::Result,
    models::{ProfileUpdate, UpdateProfileRequest, User},
    services::user_service,
    validation::ValidatedJson,
};

pub async fn update_profile(
    State(state): State<AppState>,
    auth_user: AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<User>> {
    let user = user_service::update_profile(
        state.store.as_ref(),
        auth_user.user_id,
        ProfileUpdate::from(payload),
    )
    .await?;

    Ok(Json(user))
}
