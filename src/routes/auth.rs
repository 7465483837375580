use std::sync::Mutex;

use crate::{auth::{Auth, UserSession, removal_cookie, with_session}, data::{ProfileUpdate, UserID}, db::DB, error::ApiError, render::render_own_profile};
use actix_web::{get, post, web::{Data, Json}, HttpResponse};
use log::info;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Deserialize)]
pub struct Register {
    #[serde(default)]
    user_name: String,
    #[serde(default)]
    password: String,
    avatar_url: Option<String>,
}

#[derive(Deserialize)]
pub struct Login {
    #[serde(default)]
    user_name: String,
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
pub struct AccountUpdate {
    #[serde(flatten)]
    profile: ProfileUpdate,
    /// The current password, needed only with `new_password`.
    password: Option<String>,
    new_password: Option<String>,
}

#[derive(Serialize)]
struct Account<'a> {
    id: &'a UserID,
    user_name: &'a str,
}

#[post("/api/auth/register")]
pub async fn auth_register(auth: Data<Mutex<Auth>>, db: Data<Mutex<DB>>, Json(form): Json<Register>) -> Result<HttpResponse, ApiError> {
    let mut db = db.lock()?;
    let mut auth = auth.lock()?;
    let user_name = form.user_name.trim();
    let avatar_url = form.avatar_url.filter(|x| !x.is_empty());
    let id = auth.signup(user_name, form.password.as_str(), avatar_url, &mut db)?;
    let (_, session_id) = auth.login(user_name, form.password.as_str(), &db)?;
    Ok(with_session(&mut HttpResponse::Ok(), &auth, &session_id)
        .json(json!({ "success": true, "user": Account { id: &id, user_name } })))
}

#[post("/api/auth/login")]
pub async fn auth_login(auth: Data<Mutex<Auth>>, db: Data<Mutex<DB>>, Json(form): Json<Login>) -> Result<HttpResponse, ApiError> {
    let db = db.lock()?;
    let mut auth = auth.lock()?;
    let user_name = form.user_name.trim();
    let (id, session_id) = auth.login(user_name, form.password.as_str(), &db)?;
    Ok(with_session(&mut HttpResponse::Ok(), &auth, &session_id)
        .json(json!({ "success": true, "user": Account { id: &id, user_name } })))
}

#[post("/api/auth/logout")]
pub async fn auth_logout(auth: Data<Mutex<Auth>>, user: UserSession) -> Result<HttpResponse, ApiError> {
    auth.lock()?.logout(user);
    Ok(HttpResponse::Ok()
        .cookie(removal_cookie())
        .json(json!({ "success": true })))
}

#[get("/api/auth/me")]
pub async fn auth_me(db: Data<Mutex<DB>>, user: Option<UserSession>) -> Result<HttpResponse, ApiError> {
    let db = db.lock()?;
    let me = user.as_ref()
        .and_then(|x| db.get_user(&x.user).map(|u| render_own_profile(&x.user, u)));
    Ok(HttpResponse::Ok().json(json!({ "user": me })))
}

#[post("/api/auth/update")]
pub async fn auth_update(auth: Data<Mutex<Auth>>, db: Data<Mutex<DB>>, user: UserSession, Json(form): Json<AccountUpdate>) -> Result<HttpResponse, ApiError> {
    let mut db = db.lock()?;
    if let Some(new_password) = form.new_password.as_deref().filter(|x| !x.is_empty()) {
        auth.lock()?.change_password(&db, &user.user, form.password.as_deref(), new_password)?;
        info!("password changed for {}", user.user.0);
    }
    if !db.update_user(&user.user, &form.profile)? {
        return Err(ApiError::NotFound("User"));
    }
    let me = db.get_user(&user.user).map(|u| render_own_profile(&user.user, u));
    Ok(HttpResponse::Ok().json(json!({ "success": true, "user": me })))
}
