use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::guard::Owned;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Unity,
    Threejs,
    Simulator,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Unity => "unity",
            Category::Threejs => "threejs",
            Category::Simulator => "simulator",
        }
    }

    pub fn default_thumbnail(category: &str) -> &'static str {
        if category == Category::Threejs.as_str() {
            "/images/three.png"
        } else {
            "/images/unity.jpg"
        }
    }
}

/// Post record in the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub author: String,          // userid of the creator
    pub content: String,
    pub category: String,
    pub thumbnail: Option<String>,
    pub webgl_path: Option<String>,
    pub views: i64,
    pub created_at: OffsetDateTime,
}

impl Owned for Post {
    fn owner(&self) -> &str {
        &self.author
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub author: String,
    pub content: String,
    pub category: Category,
    pub thumbnail: Option<String>,
    pub webgl_path: Option<String>,
}
