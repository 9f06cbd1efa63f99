use std::sync::Arc;

use axum::{extract::State, Json};
use fp_orders::{normalize_address, ProfileForm};
use fp_schemas::{Address, DeliveryAddress, UserRole};
use tracing::info;

use crate::{
    api_types::{ProfileSetupResponse, SetupAdminRequest, SetupResponse, UpgradeMeRequest},
    auth::AuthUser,
    error::ApiError,
    state::AppState,
};

// ---------------------------------------------------------------------------
// GET|PUT /v1/profile/address
// ---------------------------------------------------------------------------

/// `null` until the user has saved an address.
pub(crate) async fn get_address(
    State(st): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Option<Address>>, ApiError> {
    let pool = st.db()?;
    Ok(Json(fp_db::fetch_address(pool, user.id).await?))
}

pub(crate) async fn put_address(
    State(st): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(body): Json<DeliveryAddress>,
) -> Result<Json<Address>, ApiError> {
    if body.address_type.is_none() {
        return Err(ApiError::bad_request("Address type is required"));
    }
    let pool = st.db()?;
    let saved = fp_db::upsert_address(pool, user.id, &normalize_address(body)).await?;
    Ok(Json(saved))
}

// ---------------------------------------------------------------------------
// POST /v1/profile/setup
// ---------------------------------------------------------------------------

/// First-login form. Admins keep their role; everyone else takes the role
/// they picked.
pub(crate) async fn setup_profile(
    State(st): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(form): Json<ProfileForm>,
) -> Result<Json<ProfileSetupResponse>, ApiError> {
    let profile = form.into_profile()?;
    let role = if user.role.is_admin() {
        UserRole::Admin
    } else {
        profile.role
    };

    let pool = st.db()?;
    let updated = fp_db::update_user_profile(pool, user.id, &profile.name, &profile.phone, role)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;
    let address = fp_db::upsert_address(pool, user.id, &profile.address).await?;

    info!(user = %updated.email, role = updated.role.as_str(), "profile set up");
    Ok(Json(ProfileSetupResponse {
        user: updated,
        address,
    }))
}

// ---------------------------------------------------------------------------
// POST /v1/setup/admin, /v1/setup/upgrade-me
// ---------------------------------------------------------------------------

fn check_setup_key(st: &AppState, candidate: &str) -> Result<(), ApiError> {
    if st.secrets.admin_setup_key.is_none() {
        return Err(ApiError::forbidden(format!(
            "Admin setup is disabled; set {}",
            st.secrets.admin_setup_key_env
        )));
    }
    if !st.secrets.setup_key_matches(candidate) {
        return Err(ApiError::forbidden("Invalid setup key"));
    }
    Ok(())
}

/// Create an admin by email, or promote the existing user with that email.
pub(crate) async fn setup_admin(
    State(st): State<Arc<AppState>>,
    Json(req): Json<SetupAdminRequest>,
) -> Result<Json<SetupResponse>, ApiError> {
    check_setup_key(&st, &req.setup_key)?;

    let email = req.email.trim();
    if email.len() < 3 || !email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required"));
    }

    let pool = st.db()?;
    let user = fp_db::upsert_user(pool, email, req.name.as_deref(), UserRole::Admin).await?;
    if !user.role.is_admin() {
        fp_db::set_user_role(pool, user.id, UserRole::Admin).await?;
    }
    let user = fp_db::fetch_user(pool, user.id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    info!(user = %user.email, "admin set up");
    st.log_line("INFO", format!("admin set up: {}", user.email));
    Ok(Json(SetupResponse {
        success: true,
        message: "Admin user ready".to_string(),
        user,
    }))
}

pub(crate) async fn upgrade_me(
    State(st): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<UpgradeMeRequest>,
) -> Result<Json<SetupResponse>, ApiError> {
    check_setup_key(&st, &req.setup_key)?;

    let pool = st.db()?;
    fp_db::set_user_role(pool, user.id, UserRole::Admin).await?;
    let user = fp_db::fetch_user(pool, user.id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    info!(user = %user.email, "user promoted to admin");
    st.log_line("INFO", format!("user promoted to admin: {}", user.email));
    Ok(Json(SetupResponse {
        success: true,
        message: "You are now an ADMIN".to_string(),
        user,
    }))
}
