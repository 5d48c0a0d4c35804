use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::repo_types::User;
use crate::posts::repo_types::PostTitle;

/// Profile fields a user may change on their own record. Absent fields are left alone.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    /// Free text; clients send it either as a string or a number.
    pub age: Option<Value>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
}

fn as_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    }
}

impl ProfileUpdate {
    pub fn apply_to(self, user: &mut User) {
        let trimmed = |s: String| s.trim().to_string();
        if let Some(v) = self.name {
            user.name = trimmed(v);
        }
        if let Some(v) = self.bio {
            user.bio = v;
        }
        if let Some(v) = self.avatar {
            user.avatar = v;
        }
        if let Some(v) = self.firstname {
            user.firstname = trimmed(v);
        }
        if let Some(v) = self.lastname {
            user.lastname = trimmed(v);
        }
        if let Some(v) = self.age {
            user.age = as_text(v);
        }
        if let Some(v) = self.gender {
            user.gender = trimmed(v);
        }
        if let Some(v) = self.address {
            user.address = trimmed(v);
        }
        if let Some(v) = self.website {
            user.website = trimmed(v);
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// Public profile page: the user and the titles of their posts, newest first.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub user: User,
    pub posts: Vec<PostTitle>,
}
