//! Process-local stores used when no `DATABASE_URL` is configured, and by tests.
//!
//! Each store keeps rows in insertion order behind a `tokio::sync::RwLock`, so
//! "newest first" is a reverse walk and ties never reorder.

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserRepo,
        repo_types::{NewUser, StoreError, User, DEFAULT_PROFILE_IMAGE},
    },
    comments::{
        repo::CommentRepo,
        repo_types::{Comment, NewComment},
    },
    posts::{
        repo::PostRepo,
        repo_types::{NewPost, Post},
    },
    scores::{
        repo::ScoreRepo,
        repo_types::{NewScore, Score},
    },
};

#[derive(Default)]
pub struct MemoryUserRepo {
    rows: RwLock<Vec<User>>,
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_userid(&self, userid: &str) -> anyhow::Result<Option<User>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|u| u.userid == userid).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_email_and_birthdate(
        &self,
        email: &str,
        birthdate: &str,
    ) -> anyhow::Result<Option<User>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|u| u.email == email && u.birthdate == birthdate)
            .cloned())
    }

    async fn find_for_recovery(
        &self,
        userid: &str,
        email: &str,
        birthdate: &str,
    ) -> anyhow::Result<Option<User>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|u| u.userid == userid && u.email == email && u.birthdate == birthdate)
            .cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|u| u.userid == user.userid) {
            return Err(StoreError::Duplicate("UserID"));
        }
        if rows.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("Email"));
        }

        let created = User {
            userid: user.userid,
            email: user.email,
            password_hash: user.password_hash,
            gender: user.gender,
            birthdate: user.birthdate,
            profile_image: DEFAULT_PROFILE_IMAGE.to_string(),
            is_temporary_password: false,
            created_at: OffsetDateTime::now_utc(),
        };
        rows.push(created.clone());
        Ok(created)
    }

    async fn update_password(
        &self,
        userid: &str,
        password_hash: &str,
        is_temporary: bool,
    ) -> anyhow::Result<bool> {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|u| u.userid == userid) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.is_temporary_password = is_temporary;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_profile_image(&self, userid: &str, profile_image: &str) -> anyhow::Result<bool> {
        let mut rows = self.rows.write().await;
        Ok(rows
            .iter_mut()
            .find(|u| u.userid == userid)
            .map(|u| u.profile_image = profile_image.to_string())
            .is_some())
    }
}

#[derive(Default)]
pub struct MemoryPostRepo {
    rows: RwLock<Vec<Post>>,
}

#[async_trait]
impl PostRepo for MemoryPostRepo {
    async fn list(&self) -> anyhow::Result<Vec<Post>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().rev().cloned().collect())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|p| p.id == id).cloned())
    }

    async fn record_view(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let mut rows = self.rows.write().await;
        Ok(rows.iter_mut().find(|p| p.id == id).map(|p| {
            p.views += 1;
            p.clone()
        }))
    }

    async fn create(&self, post: NewPost) -> anyhow::Result<Post> {
        let created = Post {
            id: Uuid::new_v4(),
            title: post.title,
            author: post.author,
            content: post.content,
            category: post.category.as_str().to_string(),
            thumbnail: post.thumbnail,
            webgl_path: post.webgl_path,
            views: 0,
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.write().await.push(created.clone());
        Ok(created)
    }

    async fn update(&self, id: Uuid, title: &str, content: &str) -> anyhow::Result<Option<Post>> {
        let mut rows = self.rows.write().await;
        Ok(rows.iter_mut().find(|p| p.id == id).map(|p| {
            p.title = title.to_string();
            p.content = content.to_string();
            p.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|p| p.id != id);
        Ok(rows.len() != before)
    }
}

#[derive(Default)]
pub struct MemoryCommentRepo {
    rows: RwLock<Vec<Comment>>,
}

#[async_trait]
impl CommentRepo for MemoryCommentRepo {
    async fn list_for_post(&self, post_id: Uuid) -> anyhow::Result<Vec<Comment>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|c| c.post_id == post_id).cloned().collect())
    }

    async fn count_for_post(&self, post_id: Uuid) -> anyhow::Result<i64> {
        let rows = self.rows.read().await;
        Ok(rows.iter().filter(|c| c.post_id == post_id).count() as i64)
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|c| c.id == id).cloned())
    }

    async fn create(&self, comment: NewComment) -> anyhow::Result<Comment> {
        let created = Comment {
            id: Uuid::new_v4(),
            post_id: comment.post_id,
            author: comment.author,
            content: comment.content,
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.write().await.push(created.clone());
        Ok(created)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|c| c.id != id);
        Ok(rows.len() != before)
    }

    async fn delete_for_post(&self, post_id: Uuid) -> anyhow::Result<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|c| c.post_id != post_id);
        Ok((before - rows.len()) as u64)
    }
}

#[derive(Default)]
pub struct MemoryScoreRepo {
    rows: RwLock<Vec<Score>>,
}

#[async_trait]
impl ScoreRepo for MemoryScoreRepo {
    async fn insert(&self, score: NewScore) -> anyhow::Result<Score> {
        let created = Score {
            id: Uuid::new_v4(),
            game_name: score.game_name,
            score: score.score,
            username: score.username,
            created_at: OffsetDateTime::now_utc(),
        };
        self.rows.write().await.push(created.clone());
        Ok(created)
    }

    async fn top_for_game(&self, game_name: &str, limit: i64) -> anyhow::Result<Vec<Score>> {
        let rows = self.rows.read().await;
        let mut board: Vec<Score> = rows
            .iter()
            .filter(|s| s.game_name == game_name)
            .cloned()
            .collect();
        // stable sort keeps insertion order for ties
        board.sort_by(|a, b| b.score.cmp(&a.score));
        board.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(board)
    }

    async fn for_user(&self, username: &str) -> anyhow::Result<Vec<Score>> {
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .rev()
            .filter(|s| s.username == username)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::repo_types::Category;

    fn new_user(userid: &str, email: &str) -> NewUser {
        NewUser {
            userid: userid.into(),
            email: email.into(),
            password_hash: "hash".into(),
            gender: String::new(),
            birthdate: "2000-01-01".into(),
        }
    }

    fn new_post(title: &str) -> NewPost {
        NewPost {
            title: title.into(),
            author: "alice".into(),
            content: "body".into(),
            category: Category::Threejs,
            thumbnail: None,
            webgl_path: None,
        }
    }

    #[tokio::test]
    async fn users_are_unique_by_userid_and_email() {
        let repo = MemoryUserRepo::default();
        repo.create(new_user("alice", "a@x.io")).await.unwrap();

        assert!(matches!(
            repo.create(new_user("alice", "other@x.io")).await,
            Err(StoreError::Duplicate("UserID"))
        ));
        assert!(matches!(
            repo.create(new_user("bob", "a@x.io")).await,
            Err(StoreError::Duplicate("Email"))
        ));

        let stored = repo.find_by_userid("alice").await.unwrap().unwrap();
        assert_eq!(stored.profile_image, DEFAULT_PROFILE_IMAGE);
        assert!(!stored.is_temporary_password);
    }

    #[tokio::test]
    async fn recovery_lookup_needs_all_three_fields() {
        let repo = MemoryUserRepo::default();
        repo.create(new_user("alice", "a@x.io")).await.unwrap();

        assert!(repo
            .find_for_recovery("alice", "a@x.io", "2000-01-01")
            .await
            .unwrap()
            .is_some());
        assert!(repo
            .find_for_recovery("alice", "a@x.io", "1999-01-01")
            .await
            .unwrap()
            .is_none());
        assert!(!repo.update_password("ghost", "h", true).await.unwrap());
        assert!(!repo.update_profile_image("ghost", "/images/x.png").await.unwrap());
    }

    #[tokio::test]
    async fn posts_list_newest_first_and_count_views() {
        let repo = MemoryPostRepo::default();
        let first = repo.create(new_post("first")).await.unwrap();
        repo.create(new_post("second")).await.unwrap();

        let titles: Vec<_> = repo.list().await.unwrap().into_iter().map(|p| p.title).collect();
        assert_eq!(titles, vec!["second", "first"]);

        repo.record_view(first.id).await.unwrap();
        let viewed = repo.record_view(first.id).await.unwrap().unwrap();
        assert_eq!(viewed.views, 2);
        assert_eq!(viewed.category, "threejs");

        assert!(repo.record_view(Uuid::new_v4()).await.unwrap().is_none());
        assert!(repo.delete(first.id).await.unwrap());
        assert!(!repo.delete(first.id).await.unwrap());
    }

    #[tokio::test]
    async fn comments_are_removed_per_post() {
        let repo = MemoryCommentRepo::default();
        let (p1, p2) = (Uuid::new_v4(), Uuid::new_v4());
        for (post_id, text) in [(p1, "a"), (p1, "b"), (p2, "c")] {
            repo.create(NewComment {
                post_id,
                author: "bob".into(),
                content: text.into(),
            })
            .await
            .unwrap();
        }

        let listed: Vec<_> = repo
            .list_for_post(p1)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.content)
            .collect();
        assert_eq!(listed, vec!["a", "b"]);

        assert_eq!(repo.delete_for_post(p1).await.unwrap(), 2);
        assert_eq!(repo.count_for_post(p1).await.unwrap(), 0);
        assert_eq!(repo.count_for_post(p2).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn leaderboard_sorts_desc_and_limits() {
        let repo = MemoryScoreRepo::default();
        for (user, score) in [("a", 10), ("b", 30), ("c", 20), ("a", 5)] {
            repo.insert(NewScore {
                game_name: "tetris".into(),
                score,
                username: user.into(),
            })
            .await
            .unwrap();
        }
        repo.insert(NewScore {
            game_name: "snake".into(),
            score: 99,
            username: "a".into(),
        })
        .await
        .unwrap();

        let top: Vec<_> = repo
            .top_for_game("tetris", 2)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.score)
            .collect();
        assert_eq!(top, vec![30, 20]);

        let mine: Vec<_> = repo
            .for_user("a")
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.score)
            .collect();
        assert_eq!(mine, vec![99, 5, 10]);
    }
}
