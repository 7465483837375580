use std::collections::HashSet;

use ammonia::Builder;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{auth::UserSession, db::DB, error::ApiError, geo::References};

mod activities;
mod admin;
mod auth;
mod events;
mod resources;
mod users;

pub use activities::*;
pub use admin::*;
pub use auth::*;
pub use events::*;
pub use resources::*;
pub use users::*;

static TAG_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(" *\\n *").expect("valid whitespace pattern"));
static SPACES: Lazy<Regex> = Lazy::new(|| Regex::new(" +").expect("valid whitespace pattern"));

/// Cleans rich text from the editor down to a safe set of formatting tags.
pub fn sanitize_rich_text(input: &str) -> String {
    let content = Builder::new()
        .tags(HashSet::from([
            "a", "b", "blockquote", "br", "code", "em", "h1", "h2", "h3",
            "i", "img", "li", "ol", "p", "pre", "s", "span", "strong",
            "sub", "sup", "u", "ul",
        ]))
        .clean_content_tags(HashSet::from(["script", "style", "iframe"]))
        .clean(input)
        .to_string();
    let content = TAG_BREAK.replace_all(content.trim(), "<br>");
    SPACES.replace_all(&content, " ").to_string()
}

/// Plain text for comments; every tag is dropped and the text is stored as
/// typed, not as HTML.
pub fn sanitize_plain_text(input: &str) -> String {
    let text = Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(input)
        .to_string();
    html_escape::decode_html_entities(text.trim()).into_owned()
}

fn require_admin(db: &DB, user: Option<&UserSession>) -> Result<(), ApiError> {
    match user {
        None => Err(ApiError::Unauthorized),
        Some(user) if db.is_admin(&user.user) => Ok(()),
        Some(_) => Err(ApiError::Forbidden("Admin access required")),
    }
}

fn references_for(db: &DB, user: Option<&UserSession>) -> References {
    match user.and_then(|x| db.get_user(&x.user)) {
        Some(user) => References { home: user.home(), office: user.office() },
        None => References::default(),
    }
}
