use std::sync::Mutex;

use actix_web::{get, patch, web::{Data, Json}, HttpResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::{auth::UserSession, data::PrivacyPatch, db::DB, error::ApiError, geo::References, render::{render_event, render_own_profile, OwnProfileView}};

use super::require_admin;

const RECENT_EVENTS: usize = 50;

#[derive(Serialize)]
struct UserStats<'a> {
    #[serde(flatten)]
    user: OwnProfileView<'a>,
    created: DateTime<Utc>,
    hosted_events: usize,
}

#[get("/api/admin/privacy-settings")]
pub async fn admin_privacy_settings(db: Data<Mutex<DB>>) -> Result<HttpResponse, ApiError> {
    let mut db = db.lock()?;
    Ok(HttpResponse::Ok().json(db.privacy_settings()?))
}

#[patch("/api/admin/privacy-settings")]
pub async fn admin_update_privacy(db: Data<Mutex<DB>>, user: Option<UserSession>, Json(patch): Json<PrivacyPatch>) -> Result<HttpResponse, ApiError> {
    let user = user.ok_or(ApiError::Unauthorized)?;
    let mut db = db.lock()?;
    require_admin(&db, Some(&user))?;
    Ok(HttpResponse::Ok().json(db.update_privacy(&patch, &user.user)?))
}

#[get("/api/admin/stats")]
pub async fn admin_stats(db: Data<Mutex<DB>>, user: Option<UserSession>) -> Result<HttpResponse, ApiError> {
    let db = db.lock()?;
    require_admin(&db, user.as_ref())?;
    let users = db.users_with_hosted_counts().into_iter()
        .map(|(id, user, hosted_events)| UserStats {
            user: render_own_profile(id, user),
            created: user.created,
            hosted_events,
        })
        .collect::<Vec<_>>();
    let references = References::default();
    let events = db.recent_events(RECENT_EVENTS).into_iter()
        .map(|(id, event)| render_event(&db, None, &references, id, event))
        .collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(json!({ "users": users, "events": events })))
}
