use std::sync::Mutex;

use actix_web::{get, patch, post, web::{Data, Json, Path, Query}, HttpResponse};
use log::info;
use serde::Deserialize;
use serde_json::json;

use crate::{auth::UserSession, data::{ActivityID, EventDraft, EventID}, db::DB, error::ApiError, geo::{sort_events, SortMode}, render::{render_comment, render_event}};

use super::{references_for, sanitize_plain_text, sanitize_rich_text};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    All,
    Joined,
}

#[derive(Deserialize)]
pub struct EventQuery {
    activity: Option<String>,
    #[serde(default)]
    sort: SortMode,
    #[serde(default)]
    tab: Tab,
}

#[derive(Deserialize)]
pub struct NewComment {
    #[serde(default)]
    content: String,
}

fn clean_draft(mut draft: EventDraft) -> EventDraft {
    draft.description = sanitize_rich_text(&draft.description);
    draft.location = draft.location.trim().to_string();
    draft
}

#[get("/api/events")]
pub async fn events_list(db: Data<Mutex<DB>>, user: Option<UserSession>, Query(query): Query<EventQuery>) -> Result<HttpResponse, ApiError> {
    let db = db.lock()?;
    let viewer = user.as_ref().map(|x| &x.user);
    let references = references_for(&db, user.as_ref());
    let activity = query.activity.filter(|x| !x.is_empty()).map(ActivityID);

    let mut events = db.search_events(activity.as_ref());
    if query.tab == Tab::Joined {
        events.retain(|(_, e)| viewer.map_or(false, |v| e.has_participant(v)));
    }
    sort_events(&mut events, query.sort, &references, |x| x.1);

    let views = events.into_iter()
        .map(|(id, event)| render_event(&db, viewer, &references, id, event))
        .collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(views))
}

#[get("/api/events/{id}")]
pub async fn events_get(db: Data<Mutex<DB>>, user: Option<UserSession>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    let db = db.lock()?;
    let id = EventID(id.into_inner());
    let event = db.get_event(&id).ok_or(ApiError::NotFound("Event"))?;
    let references = references_for(&db, user.as_ref());
    Ok(HttpResponse::Ok().json(render_event(&db, user.as_ref().map(|x| &x.user), &references, &id, event)))
}

#[post("/api/events")]
pub async fn events_create(db: Data<Mutex<DB>>, user: UserSession, Json(draft): Json<EventDraft>) -> Result<HttpResponse, ApiError> {
    let mut db = db.lock()?;
    let id = db.create_event(&user.user, clean_draft(draft))?;
    info!("event {} created by {}", id.0, user.user.0);
    let event = db.get_event(&id).ok_or(ApiError::NotFound("Event"))?;
    let references = references_for(&db, Some(&user));
    Ok(HttpResponse::Ok().json(render_event(&db, Some(&user.user), &references, &id, event)))
}

#[patch("/api/events/{id}")]
pub async fn events_update(db: Data<Mutex<DB>>, user: UserSession, id: Path<String>, Json(draft): Json<EventDraft>) -> Result<HttpResponse, ApiError> {
    let mut db = db.lock()?;
    let id = EventID(id.into_inner());
    db.update_event(&user.user, &id, clean_draft(draft))?;
    let event = db.get_event(&id).ok_or(ApiError::NotFound("Event"))?;
    let references = references_for(&db, Some(&user));
    Ok(HttpResponse::Ok().json(render_event(&db, Some(&user.user), &references, &id, event)))
}

#[post("/api/events/{id}/join")]
pub async fn events_join(db: Data<Mutex<DB>>, user: UserSession, id: Path<String>) -> Result<HttpResponse, ApiError> {
    db.lock()?.join_event(&EventID(id.into_inner()), &user.user)?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[post("/api/events/{id}/leave")]
pub async fn events_leave(db: Data<Mutex<DB>>, user: UserSession, id: Path<String>) -> Result<HttpResponse, ApiError> {
    db.lock()?.leave_event(&EventID(id.into_inner()), &user.user)?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[get("/api/events/{id}/comments")]
pub async fn comments_list(db: Data<Mutex<DB>>, id: Path<String>) -> Result<HttpResponse, ApiError> {
    let db = db.lock()?;
    let id = EventID(id.into_inner());
    if db.get_event(&id).is_none() {
        return Err(ApiError::NotFound("Event"));
    }
    let comments = db.comments_for_event(&id).into_iter()
        .map(|(id, comment)| render_comment(&db, id, comment))
        .collect::<Vec<_>>();
    Ok(HttpResponse::Ok().json(comments))
}

#[post("/api/events/{id}/comments")]
pub async fn comments_create(db: Data<Mutex<DB>>, user: UserSession, id: Path<String>, Json(input): Json<NewComment>) -> Result<HttpResponse, ApiError> {
    let content = sanitize_plain_text(&input.content);
    if content.is_empty() {
        return Err(ApiError::bad_request("Content is required"));
    }
    let mut db = db.lock()?;
    let comment_id = db.try_comment(&content, &EventID(id.into_inner()), &user.user)?
        .ok_or(ApiError::NotFound("Event"))?;
    let comment = db.get_comment(&comment_id).ok_or(ApiError::NotFound("Comment"))?;
    Ok(HttpResponse::Ok().json(render_comment(&db, &comment_id, comment)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Auth;
    use crate::data::ProfileUpdate;
    use actix_web::{cookie::Cookie, http::StatusCode, test, App};
    use serde_json::Value;

    struct Fixture {
        _dir: tempfile::TempDir,
        auth: Auth,
        db: DB,
        activity: ActivityID,
    }

    fn fixture() -> Fixture {
        let (_dir, mut db) = crate::db::tests::temp_db();
        let activity = db.create_activity("Badminton", None, None).unwrap();
        Fixture { _dir, auth: Auth::init(7), db, activity }
    }

    impl Fixture {
        fn user(&mut self, name: &str) -> Cookie<'static> {
            self.auth.signup(name, "pw", None, &mut self.db).unwrap();
            let (_, session) = self.auth.login(name, "pw", &self.db).unwrap();
            self.auth.session_cookie(&session).into_owned()
        }
    }

    macro_rules! app {
        ($f:expr) => {
            test::init_service(App::new()
                .app_data(Data::new(Mutex::new($f.auth)))
                .app_data(Data::new(Mutex::new($f.db)))
                .service(events_list)
                .service(events_get)
                .service(events_create)
                .service(events_update)
                .service(events_join)
                .service(events_leave)
                .service(comments_list)
                .service(comments_create)).await
        };
    }

    fn draft_json(activity: &ActivityID, location: &str, lat: f64, lng: f64) -> Value {
        json!({
            "activity_id": activity,
            "start": "2024-06-03T18:00:00Z",
            "end": "2024-06-03T20:00:00Z",
            "location": location,
            "latitude": lat,
            "longitude": lng,
            "max_participants": 2,
            "description": "<p>Bring water</p><script>x</script>",
        })
    }

    #[actix_web::test]
    async fn create_join_and_fill_up() {
        let mut f = fixture();
        let host = f.user("host");
        let guest = f.user("guest");
        let late = f.user("late");
        let activity = f.activity.clone();
        let app = app!(f);

        let req = test::TestRequest::post().uri("/api/events").cookie(host.clone())
            .set_json(draft_json(&activity, "Thong Nhat Park", 21.0155, 105.843))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["description"], "<p>Bring water</p>");
        assert_eq!(body["participants"].as_array().unwrap().len(), 1);
        let id = body["id"].as_str().unwrap().to_string();

        let join = |cookie: Cookie<'static>| test::TestRequest::post()
            .uri(&format!("/api/events/{}/join", id)).cookie(cookie).to_request();
        assert_eq!(test::call_service(&app, join(host.clone())).await.status(), StatusCode::BAD_REQUEST);
        assert_eq!(test::call_service(&app, join(guest.clone())).await.status(), StatusCode::OK);
        let res = test::call_service(&app, join(late.clone())).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["error"], "Event is full");

        let leave = test::TestRequest::post().uri(&format!("/api/events/{}/leave", id)).cookie(guest.clone()).to_request();
        assert_eq!(test::call_service(&app, leave).await.status(), StatusCode::OK);
        let leave = test::TestRequest::post().uri(&format!("/api/events/{}/leave", id)).cookie(guest).to_request();
        assert_eq!(test::call_service(&app, leave).await.status(), StatusCode::OK);
        assert_eq!(test::call_service(&app, join(late)).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn only_host_may_edit() {
        let mut f = fixture();
        let host = f.user("host");
        let other = f.user("other");
        let activity = f.activity.clone();
        let app = app!(f);

        let req = test::TestRequest::post().uri("/api/events").cookie(host.clone())
            .set_json(draft_json(&activity, "Thong Nhat Park", 21.0155, 105.843))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let uri = format!("/api/events/{}", body["id"].as_str().unwrap());

        let req = test::TestRequest::patch().uri(&uri).cookie(other)
            .set_json(draft_json(&activity, "West Lake", 21.06, 105.82))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::patch().uri(&uri).cookie(host)
            .set_json(draft_json(&activity, "West Lake", 21.06, 105.82))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["location"], "West Lake");

        let req = test::TestRequest::get().uri("/api/events/missing").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn list_sorts_by_distance_from_home() {
        let mut f = fixture();
        let viewer = f.user("viewer");
        let viewer_id = f.db.find_user_by_name("viewer").unwrap().clone();
        f.db.update_user(&viewer_id, &ProfileUpdate {
            home_coordinates: Some("21.0285,105.8542".to_string()),
            ..Default::default()
        }).unwrap();
        for (location, lat, lng) in [("Saigon", 10.7769, 106.7009), ("Hoan Kiem", 21.0287, 105.8524)] {
            let mut d = crate::db::tests::draft(&f.activity, 3);
            d.location = location.to_string();
            d.latitude = Some(lat);
            d.longitude = Some(lng);
            f.db.create_event(&viewer_id, d).unwrap();
        }
        let app = app!(f);

        let req = test::TestRequest::get().uri("/api/events?sort=distance-home").cookie(viewer).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["location"], "Hoan Kiem");
        assert_eq!(body[1]["location"], "Saigon");
        assert!(body[0]["distance_from_home"].as_f64().unwrap() < 1.0);
        assert!(body[0]["distance_from_office"].is_null());

        let req = test::TestRequest::get().uri("/api/events?tab=joined").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body.as_array().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn comments_are_plain_and_newest_first() {
        let mut f = fixture();
        let user = f.user("talker");
        let id = f.db.find_user_by_name("talker").unwrap().clone();
        let event = f.db.create_event(&id, crate::db::tests::draft(&f.activity, 3)).unwrap();
        let app = app!(f);
        let uri = format!("/api/events/{}/comments", event.0);

        let req = test::TestRequest::post().uri(&uri).cookie(user.clone())
            .set_json(json!({ "content": "<b>first</b>" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["content"], "first");
        assert_eq!(body["user"]["user_name"], "talker");

        let req = test::TestRequest::post().uri(&uri).cookie(user.clone())
            .set_json(json!({ "content": "Tom & Jerry <3" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["content"], "Tom & Jerry <3");

        let req = test::TestRequest::post().uri(&uri).cookie(user)
            .set_json(json!({ "content": "  " }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post().uri(&uri).set_json(json!({ "content": "anon" })).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get().uri(&uri).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }
}
