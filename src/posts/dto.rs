use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::{Category, Post};

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub category: Category,
    pub thumbnail: Option<String>,
    pub webgl_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub content: String,
    pub category: String,
    pub thumbnail: String,
    pub webgl_path: String,
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub views: i64,
    pub comment_count: i64,
}

impl PostResponse {
    pub fn new(post: Post, comment_count: i64) -> Self {
        let thumbnail = post
            .thumbnail
            .unwrap_or_else(|| Category::default_thumbnail(&post.category).to_string());
        Self {
            id: post.id,
            title: post.title,
            author: post.author,
            content: post.content,
            category: post.category,
            thumbnail,
            webgl_path: post.webgl_path.unwrap_or_default(),
            date: post.created_at,
            views: post.views,
            comment_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(category: &str, thumbnail: Option<&str>) -> Post {
        Post {
            id: Uuid::new_v4(),
            title: "t".into(),
            author: "alice".into(),
            content: "c".into(),
            category: category.into(),
            thumbnail: thumbnail.map(str::to_string),
            webgl_path: None,
            views: 3,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn thumbnail_falls_back_by_category() {
        assert_eq!(PostResponse::new(post("threejs", None), 0).thumbnail, "/images/three.png");
        assert_eq!(PostResponse::new(post("unity", None), 0).thumbnail, "/images/unity.jpg");
        assert_eq!(PostResponse::new(post("simulator", None), 0).thumbnail, "/images/unity.jpg");
        assert_eq!(
            PostResponse::new(post("threejs", Some("/images/custom.png")), 0).thumbnail,
            "/images/custom.png"
        );
    }

    #[test]
    fn category_parses_lowercase() {
        let req: CreatePostRequest =
            serde_json::from_str(r#"{"title":"a","content":"b","category":"threejs"}"#).unwrap();
        assert_eq!(req.category, Category::Threejs);

        let req: CreatePostRequest = serde_json::from_str(r#"{"title":"a","content":"b"}"#).unwrap();
        assert_eq!(req.category, Category::Unity);
    }
}
