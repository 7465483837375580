use std::{collections::HashMap, sync::Mutex, pin::Pin, future::Future, io};

use actix_web::{cookie, FromRequest, HttpRequest, dev::Payload, ResponseError, http::StatusCode, HttpResponse, HttpResponseBuilder, cookie::{Cookie, SameSite}, web::Data};
use chrono::{NaiveDateTime, Local, Duration};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Sha256, Digest};
use rand::distributions::{Alphanumeric, DistString};

use crate::{db::DB, data::UserID, error::ErrorBody};

pub const SESSION_COOKIE: &str = "session-id";

static USER_NAME: Lazy<Regex> = Lazy::new(|| Regex::new("^[a-zA-Z0-9_-]+$").expect("valid user name pattern"));

pub struct Auth {
    sessions: HashMap<SessionID, (UserID, NaiveDateTime)>,
    max_age: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionID(pub String);

pub struct PasswordStore {
    pub salt: String,
    pub hashed: String,
}

#[derive(thiserror::Error, Debug)]
pub enum LoginError {
    #[error("Username and password are required")]
    MissingCredentials,
    #[error("Invalid credentials")]
    WrongCredentials,
}

#[derive(thiserror::Error, Debug)]
pub enum SignupError {
    #[error("Username and password are required")]
    MissingCredentials,
    #[error("Username already exists")]
    AlreadyExists,
    #[error("Invalid user name. Only alphanumeric characters, '_' & '-' are allowed")]
    InvalidUserName,
    #[error(transparent)]
    Storage(#[from] io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum PasswordError {
    #[error("Current password required")]
    CurrentRequired,
    #[error("Incorrect current password")]
    Incorrect,
    #[error(transparent)]
    Storage(#[from] io::Error),
}

fn hash(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.to_string() + salt);
    format!("{:x}", hasher.finalize())
}

impl Auth {
    pub fn init(session_days: i64) -> Self {
        Self {
            sessions: HashMap::new(),
            max_age: Duration::days(session_days),
        }
    }

    fn secure_password(password: &str) -> PasswordStore {
        let salt = Alphanumeric.sample_string(&mut rand::thread_rng(), 16);
        let hashed = hash(password, &salt);
        PasswordStore { salt, hashed }
    }

    fn match_password(db: &DB, user: &UserID, password: &str) -> bool {
        match db.store().load_user_auth(user) {
            Some(store) => hash(password, &store.salt) == store.hashed,
            None => false,
        }
    }

    fn gen_session_id(&self) -> SessionID {
        let id = SessionID(Alphanumeric.sample_string(&mut rand::thread_rng(), 128));
        if self.sessions.contains_key(&id) {
            self.gen_session_id()
        } else {
            id
        }
    }

    fn create_session(&mut self, user: UserID) -> SessionID {
        let session_id = self.gen_session_id();
        self.sessions.insert(session_id.clone(), (user, Local::now().naive_local()));
        session_id
    }

    pub fn signup(&mut self, user_name: &str, password: &str, avatar_url: Option<String>, db: &mut DB) -> Result<UserID, SignupError> {
        if user_name.is_empty() || password.is_empty() {
            Err(SignupError::MissingCredentials)
        } else if !USER_NAME.is_match(user_name) {
            Err(SignupError::InvalidUserName)
        } else if db.find_user_by_name(user_name).is_some() {
            Err(SignupError::AlreadyExists)
        } else {
            let password_store = Self::secure_password(password);
            let id = db.create_new_user(user_name, avatar_url, &password_store)?;
            info!("new user {} ({})", user_name, id.0);
            Ok(id)
        }
    }

    pub fn login(&mut self, user_name: &str, password: &str, db: &DB) -> Result<(UserID, SessionID), LoginError> {
        if user_name.is_empty() || password.is_empty() {
            return Err(LoginError::MissingCredentials);
        }
        match db.find_user_by_name(user_name) {
            Some(id) if Self::match_password(db, id, password) => {
                let id = id.clone();
                Ok((id.clone(), self.create_session(id)))
            }
            _ => {
                warn!("failed login for {}", user_name);
                Err(LoginError::WrongCredentials)
            }
        }
    }

    pub fn change_password(&self, db: &DB, user: &UserID, current: Option<&str>, new: &str) -> Result<(), PasswordError> {
        let current = current.filter(|x| !x.is_empty()).ok_or(PasswordError::CurrentRequired)?;
        if !Self::match_password(db, user, current) {
            return Err(PasswordError::Incorrect);
        }
        db.store().store_user_auth(user, &Self::secure_password(new))?;
        Ok(())
    }

    pub fn logout(&mut self, user: UserSession) {
        self.sessions.remove(&user.session_id);
    }

    /// Looks up a session and marks it as used. Sessions idle for longer than
    /// the configured age are dropped.
    pub fn get_user_for_session_id(&mut self, session_id: &SessionID) -> Option<&UserID> {
        let now = Local::now().naive_local();
        let expired = match self.sessions.get(session_id) {
            Some((_, last_use)) => now.signed_duration_since(*last_use) > self.max_age,
            None => return None,
        };
        if expired {
            self.sessions.remove(session_id);
            return None;
        }
        self.sessions.get_mut(session_id).map(|(user, last_use)| {
            *last_use = now;
            &*user
        })
    }

    pub fn delete_sessions_older_than(&mut self, age: &Duration) {
        let now = Local::now().naive_local();
        self.sessions.retain(|_, (_, last_use)| now.signed_duration_since(*last_use) <= *age)
    }

    pub fn session_cookie<'a>(&self, session_id: &'a SessionID) -> Cookie<'a> {
        build_session_cookie(session_id, self.max_age)
    }
}

pub struct UserSession {
    pub user: UserID,
    pub session_id: SessionID,
}

pub fn build_session_cookie(session_id: &SessionID, max_age: Duration) -> Cookie<'_> {
    Cookie::build(SESSION_COOKIE, session_id.0.as_str())
        .path("/")
        //.secure(true) <-- only works with https
        .same_site(SameSite::Strict)
        .http_only(true)
        .max_age(cookie::time::Duration::seconds(max_age.num_seconds()))
        .finish()
}

pub fn removal_cookie() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.make_removal();
    cookie
}

pub fn with_session<'a>(response: &'a mut HttpResponseBuilder, auth: &Auth, session_id: &SessionID) -> &'a mut HttpResponseBuilder {
    response.cookie(auth.session_cookie(session_id))
}

#[derive(thiserror::Error, Debug)]
pub enum SessionRequestError {
    #[error("Unauthorized")]
    NoSession,
}

impl ResponseError for SessionRequestError {
    fn status_code(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody { error: self.to_string() })
    }
}

impl FromRequest for UserSession {
    type Error = SessionRequestError;
    type Future = Pin<Box<dyn Future<Output = Result<Self, Self::Error>>>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let session = req.cookie(SESSION_COOKIE)
            .map(|c| SessionID(c.value().to_string()))
            .and_then(|id| {
                let auth = req.app_data::<Data<Mutex<Auth>>>()?;
                let mut auth = auth.lock().ok()?;
                let user = auth.get_user_for_session_id(&id)?.clone();
                Some(UserSession { user, session_id: id })
            });
        Box::pin(async move {
            session.ok_or(SessionRequestError::NoSession)
        })
    }
}
