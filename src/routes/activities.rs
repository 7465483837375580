use std::sync::Mutex;

use actix_web::{get, post, web::{Data, Json}, HttpResponse};
use log::info;
use serde::Deserialize;

use crate::{auth::UserSession, db::DB, error::ApiError, render::render_activity};

#[derive(Deserialize)]
pub struct NewActivity {
    #[serde(default)]
    name: String,
    description: Option<String>,
    image_url: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|x| x.trim().to_string()).filter(|x| !x.is_empty())
}

#[get("/api/activities")]
pub async fn activities_list(db: Data<Mutex<DB>>, user: Option<UserSession>) -> Result<HttpResponse, ApiError> {
    let db = db.lock()?;
    let viewer = user.as_ref().map(|x| &x.user);
    let activities = db.get_sorted_activities().into_iter()
        .map(|(id, activity)| render_activity(&db, viewer, id, activity))
        .collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(activities))
}

#[post("/api/activities")]
pub async fn activities_create(db: Data<Mutex<DB>>, user: UserSession, Json(input): Json<NewActivity>) -> Result<HttpResponse, ApiError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Name is required"));
    }
    let mut db = db.lock()?;
    let id = db.create_activity(name, non_empty(input.description), non_empty(input.image_url))?;
    info!("activity {} ({}) created by {}", name, id.0, user.user.0);
    let activity = db.get_activity(&id).ok_or(ApiError::NotFound("Activity"))?;
    Ok(HttpResponse::Ok().json(render_activity(&db, Some(&user.user), &id, activity)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::Auth, db::tests::temp_db};
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn create_then_list() {
        let (_dir, mut db) = temp_db();
        let mut auth = Auth::init(7);
        auth.signup("lan", "pw", None, &mut db).unwrap();
        let (_, session) = auth.login("lan", "pw", &db).unwrap();
        let cookie = auth.session_cookie(&session).into_owned();
        let app = test::init_service(App::new()
            .app_data(Data::new(Mutex::new(auth)))
            .app_data(Data::new(Mutex::new(db)))
            .service(activities_list)
            .service(activities_create)).await;

        let req = test::TestRequest::post().uri("/api/activities").cookie(cookie.clone())
            .set_json(json!({ "name": "  " }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "Name is required");

        let req = test::TestRequest::post().uri("/api/activities").cookie(cookie)
            .set_json(json!({ "name": "Table tennis", "description": "" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["name"], "Table tennis");
        assert!(body["description"].is_null());

        let req = test::TestRequest::get().uri("/api/activities").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["name"], "Table tennis");
        assert_eq!(body[0]["favorite"], false);
    }
}
