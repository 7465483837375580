use std::{sync::Mutex, io, time::Duration};
use actix_web::{web::{self, Data}, App, HttpServer, HttpResponse, ResponseError, middleware::Logger, http::Method, rt};
use log::{error, info, warn};

use auth::{Auth, SignupError};
use crate::config::{AdminConfig, AppConfig};
use db::{Store, DB};
use error::ApiError;
use routes::*;

mod render;
mod routes;
mod data;
mod geo;

mod auth;
mod config;
mod db;
mod error;

const SESSION_SWEEP: Duration = Duration::from_secs(60 * 60);

async fn default_handler(req: Method) -> HttpResponse {
    match req {
        Method::GET => ApiError::NotFound("Route").error_response(),
        _ => HttpResponse::MethodNotAllowed().json(error::ErrorBody { error: "Method not allowed".to_string() }),
    }
}

/// Creates the configured administrator on first start and makes sure the
/// account keeps its role afterwards.
fn bootstrap_admin(auth: &mut Auth, db: &mut DB, admin: &AdminConfig) -> Result<(), SignupError> {
    let id = match db.find_user_by_name(&admin.user_name) {
        Some(id) => id.clone(),
        None => {
            let id = auth.signup(&admin.user_name, &admin.password, None, db)?;
            info!("created admin account {}", admin.user_name);
            if admin.uses_default_password() {
                warn!("admin account {} uses the default password, set OFFICE_ADMIN__PASSWORD", admin.user_name);
            }
            id
        }
    };
    if !db.is_admin(&id) {
        db.grant_admin(&id)?;
    }
    Ok(())
}

fn init_log(config: &AppConfig) {
    env_logger::Builder::new()
        .filter(None, config.log_level.filter())
        .init();
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = AppConfig::load()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
    init_log(&config);

    let mut auth = Auth::init(config.auth.session_days);
    let mut db = DB::load(Store::new(config.store.path.clone()));
    if let Err(e) = bootstrap_admin(&mut auth, &mut db, &config.admin) {
        error!("could not create admin account {}: {}", config.admin.user_name, e);
    }
    std::fs::create_dir_all(&config.store.uploads)?;

    let auth = Data::new(Mutex::new(auth));
    let db = Data::new(Mutex::new(db));
    let uploads = Data::new(UploadDir(config.store.uploads.clone()));

    let sweeper = auth.clone();
    let max_age = chrono::Duration::days(config.auth.session_days);
    rt::spawn(async move {
        let mut tick = rt::time::interval(SESSION_SWEEP);
        loop {
            tick.tick().await;
            match sweeper.lock() {
                Ok(mut auth) => auth.delete_sessions_older_than(&max_age),
                Err(_) => error!("session store lock poisoned"),
            }
        }
    });

    info!("listening on {}:{}", config.server.host, config.server.port);
    HttpServer::new(move || {
        App::new()
            .service(auth_register)
            .service(auth_login)
            .service(auth_logout)
            .service(auth_me)
            .service(auth_update)

            .service(activities_list)
            .service(activities_create)

            .service(events_list)
            .service(events_get)
            .service(events_create)
            .service(events_update)
            .service(events_join)
            .service(events_leave)
            .service(comments_list)
            .service(comments_create)

            .service(users_get)
            .service(user_events)
            .service(user_favorites)
            .service(user_toggle_favorite)
            .service(locations_suggest)

            .service(admin_privacy_settings)
            .service(admin_update_privacy)
            .service(admin_stats)

            .service(upload)
            .service(uploads_service(&uploads))
            .app_data(web::JsonConfig::default().error_handler(|e, _| ApiError::bad_request(e).into()))
            .app_data(web::QueryConfig::default().error_handler(|e, _| ApiError::bad_request(e).into()))
            .app_data(upload_payload_config())
            .app_data(auth.clone())
            .app_data(db.clone())
            .app_data(uploads.clone())
            .wrap(Logger::default())
            .default_service(web::to(default_handler))
    })
    .bind(config.address())?
    .run()
    .await
}
