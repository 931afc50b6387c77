/// Comment service - threaded retrieval, CRUD, and like toggling
use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{comment_repo, like_repo, post_repo, user_repo};
use crate::error::{AppError, Result};
use crate::middleware::AuthUser;
use crate::models::{
    AuthorInfo, Comment, CommentInput, CommentPage, CommentResponse, CommentWithAuthorRow,
};
use crate::services::is_unique_violation;

pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Top-level approved comments for a post, newest first, each carrying
    /// its direct replies (one level only).
    pub async fn list_for_post(
        &self,
        post_id: Uuid,
        page: Option<i64>,
        limit: Option<i64>,
    ) -> Result<CommentPage> {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * limit;

        let (tops, total) = tokio::try_join!(
            comment_repo::top_level_for_post(&self.pool, post_id, limit, offset),
            comment_repo::count_top_level(&self.pool, post_id)
        )?;

        let parent_ids: Vec<Uuid> = tops.iter().map(|c| c.id).collect();
        let replies = if parent_ids.is_empty() {
            Vec::new()
        } else {
            comment_repo::replies_for(&self.pool, &parent_ids).await?
        };

        let mut like_ids = parent_ids.clone();
        like_ids.extend(replies.iter().map(|r| r.id));
        let likes: HashMap<Uuid, i64> = if like_ids.is_empty() {
            HashMap::new()
        } else {
            like_repo::count_comment_likes_batch(&self.pool, &like_ids)
                .await?
                .into_iter()
                .collect()
        };

        let comments = assemble_thread(tops, replies, &likes);
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

        Ok(CommentPage {
            comments,
            total_pages,
            current_page: page,
            total,
        })
    }

    /// Create a comment; the target post must exist and accept comments.
    pub async fn create(&self, actor: &AuthUser, input: &CommentInput) -> Result<CommentResponse> {
        let post = post_repo::find_by_id(&self.pool, input.post)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        if !post.is_comment_enabled {
            return Err(AppError::Authorization(
                "Comments are disabled for this post".to_string(),
            ));
        }

        if let Some(parent_id) = input.parent_comment {
            comment_repo::find_by_id(&self.pool, parent_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Parent comment not found".to_string()))?;
        }

        let comment = comment_repo::insert(
            &self.pool,
            input.post,
            actor.id,
            &input.content,
            input.parent_comment,
        )
        .await?;

        self.with_author(comment).await
    }

    /// Edit a comment; only the author may edit.
    pub async fn update(
        &self,
        comment_id: Uuid,
        actor: &AuthUser,
        content: &str,
    ) -> Result<CommentResponse> {
        let comment = comment_repo::find_by_id(&self.pool, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        if comment.author_id != actor.id {
            return Err(AppError::Authorization("Access denied".to_string()));
        }

        let updated = comment_repo::update_content(&self.pool, comment_id, content)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        self.with_author(updated).await
    }

    /// Delete a comment; the author or an admin may delete.
    pub async fn delete(&self, comment_id: Uuid, actor: &AuthUser) -> Result<()> {
        let comment = comment_repo::find_by_id(&self.pool, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        if comment.author_id != actor.id && !actor.role.is_admin() {
            return Err(AppError::Authorization("Access denied".to_string()));
        }

        comment_repo::delete(&self.pool, comment_id).await?;
        Ok(())
    }

    /// Membership-based like toggle, same discipline as posts.
    pub async fn toggle_like(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<crate::models::LikeToggleResponse> {
        comment_repo::find_by_id(&self.pool, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

        let was_liked = like_repo::comment_like_exists(&self.pool, comment_id, user_id).await?;

        if was_liked {
            like_repo::delete_comment_like(&self.pool, comment_id, user_id).await?;
        } else {
            match like_repo::insert_comment_like(&self.pool, comment_id, user_id).await {
                Ok(()) => {}
                Err(e) if is_unique_violation(&e, None) => {
                    tracing::debug!(%comment_id, %user_id, "duplicate like suppressed");
                }
                Err(e) => return Err(e.into()),
            }
        }

        let likes_count = like_repo::count_comment_likes(&self.pool, comment_id).await?;

        Ok(crate::models::LikeToggleResponse {
            message: if was_liked {
                "Comment unliked".to_string()
            } else {
                "Comment liked".to_string()
            },
            likes_count,
            is_liked: !was_liked,
        })
    }

    async fn with_author(&self, comment: Comment) -> Result<CommentResponse> {
        let author = user_repo::find_summary(&self.pool, comment.author_id)
            .await?
            .map(|u| AuthorInfo {
                id: u.id,
                username: u.username,
                avatar: u.avatar_url,
            });

        let likes_count = like_repo::count_comment_likes(&self.pool, comment.id).await?;

        Ok(CommentResponse {
            id: comment.id,
            content: comment.content,
            author,
            post_id: comment.post_id,
            parent_comment_id: comment.parent_comment_id,
            is_approved: comment.is_approved,
            likes_count,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            replies: Vec::new(),
        })
    }
}

fn author_of(row: &CommentWithAuthorRow) -> Option<AuthorInfo> {
    row.author_username.clone().map(|username| AuthorInfo {
        id: row.author_id,
        username,
        avatar: row.author_avatar.clone(),
    })
}

/// Attach each reply to its parent. Replies arrive oldest-first and stay in
/// that order; top-level ordering is whatever the caller fetched.
fn assemble_thread(
    tops: Vec<CommentWithAuthorRow>,
    replies: Vec<CommentWithAuthorRow>,
    likes: &HashMap<Uuid, i64>,
) -> Vec<CommentResponse> {
    let mut replies_by_parent: HashMap<Uuid, Vec<CommentResponse>> = HashMap::new();
    for reply in replies {
        let Some(parent_id) = reply.parent_comment_id else {
            continue;
        };
        let node = CommentResponse {
            id: reply.id,
            content: reply.content.clone(),
            author: author_of(&reply),
            post_id: reply.post_id,
            parent_comment_id: reply.parent_comment_id,
            is_approved: reply.is_approved,
            likes_count: likes.get(&reply.id).copied().unwrap_or(0),
            created_at: reply.created_at,
            updated_at: reply.updated_at,
            replies: Vec::new(),
        };
        replies_by_parent.entry(parent_id).or_default().push(node);
    }

    tops.into_iter()
        .map(|top| {
            let children = replies_by_parent.remove(&top.id).unwrap_or_default();
            CommentResponse {
                id: top.id,
                content: top.content.clone(),
                author: author_of(&top),
                post_id: top.post_id,
                parent_comment_id: top.parent_comment_id,
                is_approved: top.is_approved,
                likes_count: likes.get(&top.id).copied().unwrap_or(0),
                created_at: top.created_at,
                updated_at: top.updated_at,
                replies: children,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn comment_row(
        id: Uuid,
        post_id: Uuid,
        parent: Option<Uuid>,
        minutes_ago: i64,
    ) -> CommentWithAuthorRow {
        let at = Utc::now() - Duration::minutes(minutes_ago);
        CommentWithAuthorRow {
            id,
            content: format!("comment {}", id),
            author_id: Uuid::new_v4(),
            post_id,
            parent_comment_id: parent,
            is_approved: true,
            created_at: at,
            updated_at: at,
            author_username: Some("nurse_joy".to_string()),
            author_avatar: None,
        }
    }

    #[test]
    fn test_assemble_thread_one_level() {
        let post_id = Uuid::new_v4();
        let newer = Uuid::new_v4();
        let older = Uuid::new_v4();
        let reply = Uuid::new_v4();

        // Newest-first top level, as the repository returns them.
        let tops = vec![
            comment_row(newer, post_id, None, 5),
            comment_row(older, post_id, None, 60),
        ];
        let replies = vec![comment_row(reply, post_id, Some(older), 30)];

        let likes = HashMap::from([(reply, 2_i64)]);
        let thread = assemble_thread(tops, replies, &likes);

        assert_eq!(thread.len(), 2);
        assert_eq!(thread[0].id, newer);
        assert!(thread[0].replies.is_empty());
        assert_eq!(thread[1].id, older);
        assert_eq!(thread[1].replies.len(), 1);
        assert_eq!(thread[1].replies[0].id, reply);
        assert_eq!(thread[1].replies[0].likes_count, 2);
        // Replies never nest further.
        assert!(thread[1].replies[0].replies.is_empty());
    }

    #[test]
    fn test_assemble_thread_orphan_replies_are_dropped() {
        let post_id = Uuid::new_v4();
        let top = Uuid::new_v4();
        let stranger_parent = Uuid::new_v4();

        let tops = vec![comment_row(top, post_id, None, 1)];
        let replies = vec![comment_row(Uuid::new_v4(), post_id, Some(stranger_parent), 1)];

        let thread = assemble_thread(tops, replies, &HashMap::new());
        assert_eq!(thread.len(), 1);
        assert!(thread[0].replies.is_empty());
    }

    #[test]
    fn test_assemble_thread_reply_order_preserved() {
        let post_id = Uuid::new_v4();
        let top = Uuid::new_v4();
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        let tops = vec![comment_row(top, post_id, None, 90)];
        // Oldest-first, as the repository returns replies.
        let replies = vec![
            comment_row(first, post_id, Some(top), 60),
            comment_row(second, post_id, Some(top), 10),
        ];

        let thread = assemble_thread(tops, replies, &HashMap::new());
        let ids: Vec<Uuid> = thread[0].replies.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first, second]);
    }
}
