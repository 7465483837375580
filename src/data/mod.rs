use serde::{Deserialize, Serialize};

mod activity;
mod comment;
mod event;
mod privacy;
mod user;

pub use activity::*;
pub use comment::*;
pub use event::*;
pub use privacy::*;
pub use user::*;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserID(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventID(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityID(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommentID(pub String);

macro_rules! id_from_string {
    ($($id:ident),*) => {$(
        impl From<String> for $id {
            fn from(x: String) -> Self {
                Self(x)
            }
        }
    )*};
}

id_from_string!(UserID, EventID, ActivityID, CommentID);
