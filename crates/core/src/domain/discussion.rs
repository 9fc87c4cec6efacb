use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscussionSummary {
    pub id: String,
    pub number: i32,
    pub title: String,
    pub url: String,
    pub author_login: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discussion {
    pub id: String,
    pub number: i32,
    pub title: String,
    pub url: String,
    pub author_login: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub category: Option<String>,
    pub body: String,
    pub locked: bool,
    pub answered: bool,
    pub labels: Vec<String>,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub author_login: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_minimized: bool,
    pub minimized_reason: Option<String>,
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    pub author_login: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_minimized: bool,
    pub minimized_reason: Option<String>,
}

impl Discussion {
    /// Every known author login: the post, then comments and their replies in order.
    pub fn participants(&self) -> impl Iterator<Item = &str> {
        let post = self.author_login.as_deref();
        let thread = self.comments.iter().flat_map(|comment| {
            std::iter::once(comment.author_login.as_deref()).chain(
                comment
                    .replies
                    .iter()
                    .map(|reply| reply.author_login.as_deref()),
            )
        });
        std::iter::once(post).chain(thread).flatten()
    }

    pub fn reply_count(&self) -> usize {
        self.comments.iter().map(|comment| comment.replies.len()).sum()
    }
}
