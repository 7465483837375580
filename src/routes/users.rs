use std::sync::Mutex;

use actix_web::{get, post, web::{Data, Json, Path, Query}, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{auth::UserSession, data::{ActivityID, UserID}, db::DB, error::ApiError, render::{render_activity, render_event, render_profile}};

use super::references_for;

#[derive(Deserialize)]
pub struct FavoriteToggle {
    activity_id: Option<String>,
}

#[derive(Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    query: String,
}

#[get("/api/users/{id}")]
pub async fn users_get(db: Data<Mutex<DB>>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    let db = db.lock()?;
    let profile = render_profile(&db, &UserID(id.into_inner())).ok_or(ApiError::NotFound("User"))?;
    Ok(HttpResponse::Ok().json(profile))
}

#[get("/api/user/events")]
pub async fn user_events(db: Data<Mutex<DB>>, user: UserSession) -> Result<HttpResponse, ApiError> {
    let db = db.lock()?;
    let references = references_for(&db, Some(&user));
    let events = db.events_for_user(&user.user).into_iter()
        .map(|(id, event)| render_event(&db, Some(&user.user), &references, id, event))
        .collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(events))
}

#[get("/api/user/favorites")]
pub async fn user_favorites(db: Data<Mutex<DB>>, user: Option<UserSession>) -> Result<HttpResponse, ApiError> {
    let db = db.lock()?;
    let favorites = match &user {
        Some(user) => db.favorites(&user.user).into_iter()
            .map(|(id, activity)| render_activity(&db, Some(&user.user), id, activity))
            .collect(),
        None => vec![],
    };
    Ok(HttpResponse::Ok().json(json!({ "favorites": favorites })))
}

#[post("/api/user/favorites")]
pub async fn user_toggle_favorite(db: Data<Mutex<DB>>, user: UserSession, Json(input): Json<FavoriteToggle>) -> Result<HttpResponse, ApiError> {
    let activity = input.activity_id
        .filter(|x| !x.is_empty())
        .map(ActivityID)
        .ok_or(ApiError::bad_request("Activity ID required"))?;
    let favorite = db.lock()?
        .toggle_favorite(&user.user, &activity)?
        .ok_or(ApiError::NotFound("Activity"))?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "is_favorite": favorite })))
}

#[get("/api/locations/suggest")]
pub async fn locations_suggest(db: Data<Mutex<DB>>, user: Option<UserSession>, Query(input): Query<SuggestQuery>) -> Result<HttpResponse, ApiError> {
    let db = db.lock()?;
    let suggestions = db.suggest_locations(user.as_ref().map(|x| &x.user), input.query.trim());
    Ok(HttpResponse::Ok().json(json!({ "suggestions": suggestions })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::Auth, data::{PrivacyPatch, ProfileUpdate}, db::tests::temp_db};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;

    #[actix_web::test]
    async fn profile_follows_stored_policy() {
        let (_dir, mut db) = temp_db();
        let mut auth = Auth::init(7);
        let id = auth.signup("thu", "pw", None, &mut db).unwrap();
        db.update_user(&id, &ProfileUpdate {
            full_name: Some("Do Thu".to_string()),
            home_address: Some("7 Tran Phu".to_string()),
            ..Default::default()
        }).unwrap();
        db.update_privacy(&PrivacyPatch::default(), &id).unwrap();
        let app = test::init_service(App::new()
            .app_data(Data::new(Mutex::new(auth)))
            .app_data(Data::new(Mutex::new(db)))
            .service(users_get)).await;

        let req = test::TestRequest::get().uri(&format!("/api/users/{}", id.0)).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["full_name"], "Do Thu");
        assert!(body.get("home_address").is_none());

        let req = test::TestRequest::get().uri("/api/users/nobody").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn toggle_favorite() {
        let (_dir, mut db) = temp_db();
        let mut auth = Auth::init(7);
        auth.signup("thu", "pw", None, &mut db).unwrap();
        let (_, session) = auth.login("thu", "pw", &db).unwrap();
        let cookie = auth.session_cookie(&session).into_owned();
        let activity = db.create_activity("Yoga", None, None).unwrap();
        let app = test::init_service(App::new()
            .app_data(Data::new(Mutex::new(auth)))
            .app_data(Data::new(Mutex::new(db)))
            .service(user_favorites)
            .service(user_toggle_favorite)).await;

        let toggle = || test::TestRequest::post().uri("/api/user/favorites")
            .cookie(cookie.clone())
            .set_json(json!({ "activity_id": activity }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, toggle()).await;
        assert_eq!(body["is_favorite"], true);

        let req = test::TestRequest::get().uri("/api/user/favorites").cookie(cookie.clone()).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["favorites"][0]["name"], "Yoga");
        assert_eq!(body["favorites"][0]["favorite"], true);

        let body: Value = test::call_and_read_body_json(&app, toggle()).await;
        assert_eq!(body["is_favorite"], false);

        let req = test::TestRequest::post().uri("/api/user/favorites")
            .cookie(cookie.clone())
            .set_json(json!({}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get().uri("/api/user/favorites").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["favorites"].as_array().unwrap().is_empty());
    }
}
