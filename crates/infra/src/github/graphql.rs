use std::fmt;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::github::retry::{IsRetryable, RetryPolicy};
use harvest_core::domain::{Comment, Discussion, DiscussionSummary, Reply};
use harvest_core::pagination::Page;
use harvest_core::types::RepoId;

pub const GRAPHQL_ENDPOINT: &str = "https://api.github.com/graphql";
const USER_AGENT: &str = "discussion-harvest";
const RATE_LIMITED_TYPE: &str = "RATE_LIMITED";
/// GitHub search never returns more than this many results for one query.
pub const SEARCH_RESULT_LIMIT: u64 = 1000;

#[derive(Debug, Error)]
pub enum GithubError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bad credentials: {0}")]
    Unauthorized(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response: {0}")]
    InvalidResponse(#[from] serde_json::Error),
    #[error("graphql error: {0}")]
    Graphql(String),
    #[error("missing data: {0}")]
    MissingData(&'static str),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
}

impl GithubError {
    pub fn is_auth(&self) -> bool {
        matches!(self, GithubError::Unauthorized(_))
    }
}

impl IsRetryable for GithubError {
    fn is_retryable(&self) -> bool {
        match self {
            GithubError::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            GithubError::RateLimited(_) => true,
            GithubError::Status { status, .. } => *status >= 500,
            GithubError::Unauthorized(_)
            | GithubError::InvalidResponse(_)
            | GithubError::Graphql(_)
            | GithubError::MissingData(_)
            | GithubError::InvalidTimestamp(_) => false,
        }
    }
}

/// A listing node whose fields could not be mapped into a summary.
#[derive(Debug, Error)]
#[error("discussion #{number}: {error}")]
pub struct MalformedEntry {
    pub number: i32,
    #[source]
    pub error: GithubError,
}

pub type ListingEntry = Result<DiscussionSummary, MalformedEntry>;

#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    token: String,
    endpoint: String,
    retry: RetryPolicy,
}

impl fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubClient")
            .field("endpoint", &self.endpoint)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

/// A comment plus the cursor of its unread replies, if any remain.
#[derive(Debug)]
pub(crate) struct PendingComment {
    pub comment: Comment,
    pub replies_cursor: Option<String>,
}

#[derive(Debug)]
pub(crate) struct DiscussionHead {
    pub discussion: Discussion,
    pub comments: Page<PendingComment>,
}

const COMMENT_FIELDS: &str = r#"
    fragment ReplyFields on DiscussionComment {
      id
      bodyText
      createdAt
      updatedAt
      isMinimized
      minimizedReason
      author { login }
    }

    fragment CommentFields on DiscussionComment {
      ...ReplyFields
      replies(first: $first) {
        pageInfo { endCursor hasNextPage }
        nodes { ...ReplyFields }
      }
    }
"#;

impl GithubClient {
    pub fn new(http: reqwest::Client, token: String) -> Self {
        Self {
            http,
            token,
            endpoint: GRAPHQL_ENDPOINT.to_string(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub async fn search_discussions(
        &self,
        search: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<Page<ListingEntry>, GithubError> {
        let query = r#"
            query SearchDiscussions($query: String!, $first: Int!, $after: String) {
              search(query: $query, type: DISCUSSION, first: $first, after: $after) {
                discussionCount
                pageInfo { endCursor hasNextPage }
                nodes {
                  ... on Discussion {
                    id
                    number
                    title
                    url
                    createdAt
                    updatedAt
                    author { login }
                  }
                }
              }
            }
        "#;
        let vars = SearchVars {
            query: search,
            first,
            after,
        };
        let data: SearchResponse = self.graphql(query, vars).await?;
        debug!(
            total = data.search.discussion_count,
            has_next = data.search.page_info.has_next_page,
            "search page received"
        );
        if after.is_none() && exceeds_search_limit(data.search.discussion_count) {
            warn!(
                total = data.search.discussion_count,
                limit = SEARCH_RESULT_LIMIT,
                "search matches more discussions than github returns, listing will be cut short"
            );
        }
        let items = data
            .search
            .nodes
            .into_iter()
            .flatten()
            .map(|node| {
                let number = node.number;
                node.into_summary().map_err(|error| MalformedEntry { number, error })
            })
            .collect();
        Ok(data.search.page_info.into_page(items))
    }

    pub(crate) async fn discussion_head(
        &self,
        repo: &RepoId,
        number: i32,
        first: u32,
    ) -> Result<DiscussionHead, GithubError> {
        let query = format!(
            r#"
            query DiscussionDetail($owner: String!, $name: String!, $number: Int!, $first: Int!) {{
              repository(owner: $owner, name: $name) {{
                discussion(number: $number) {{
                  id
                  number
                  title
                  url
                  createdAt
                  updatedAt
                  bodyText
                  locked
                  author {{ login }}
                  category {{ name }}
                  answer {{ id }}
                  labels(first: 20) {{ nodes {{ name }} }}
                  comments(first: $first) {{
                    pageInfo {{ endCursor hasNextPage }}
                    nodes {{ ...CommentFields }}
                  }}
                }}
              }}
            }}
            {COMMENT_FIELDS}
        "#
        );
        let vars = DiscussionVars {
            owner: repo.owner(),
            name: repo.name(),
            number,
            first,
            after: None,
        };
        let data: DiscussionResponse<DiscussionDetailNode> = self.graphql(&query, vars).await?;
        let node = data
            .repository
            .ok_or(GithubError::MissingData("repository"))?
            .discussion
            .ok_or(GithubError::MissingData("discussion"))?;
        node.into_head()
    }

    pub(crate) async fn comment_page(
        &self,
        repo: &RepoId,
        number: i32,
        first: u32,
        after: Option<&str>,
    ) -> Result<Page<PendingComment>, GithubError> {
        let query = format!(
            r#"
            query DiscussionComments($owner: String!, $name: String!, $number: Int!, $first: Int!, $after: String) {{
              repository(owner: $owner, name: $name) {{
                discussion(number: $number) {{
                  comments(first: $first, after: $after) {{
                    pageInfo {{ endCursor hasNextPage }}
                    nodes {{ ...CommentFields }}
                  }}
                }}
              }}
            }}
            {COMMENT_FIELDS}
        "#
        );
        let vars = DiscussionVars {
            owner: repo.owner(),
            name: repo.name(),
            number,
            first,
            after,
        };
        let data: DiscussionResponse<CommentsOnlyNode> = self.graphql(&query, vars).await?;
        let node = data
            .repository
            .ok_or(GithubError::MissingData("repository"))?
            .discussion
            .ok_or(GithubError::MissingData("discussion"))?;
        node.comments.into_page()
    }

    pub(crate) async fn reply_page(
        &self,
        comment_id: &str,
        first: u32,
        after: Option<&str>,
    ) -> Result<Page<Reply>, GithubError> {
        let query = r#"
            query CommentReplies($id: ID!, $first: Int!, $after: String) {
              node(id: $id) {
                ... on DiscussionComment {
                  replies(first: $first, after: $after) {
                    pageInfo { endCursor hasNextPage }
                    nodes {
                      id
                      bodyText
                      createdAt
                      updatedAt
                      isMinimized
                      minimizedReason
                      author { login }
                    }
                  }
                }
              }
            }
        "#;
        let vars = NodeVars {
            id: comment_id,
            first,
            after,
        };
        let data: ReplyNodeResponse = self.graphql(query, vars).await?;
        let replies = data
            .node
            .and_then(|node| node.replies)
            .ok_or(GithubError::MissingData("comment replies"))?;
        let mut items = Vec::with_capacity(replies.nodes.len());
        for reply in replies.nodes {
            items.push(map_reply(reply)?);
        }
        Ok(replies.page_info.into_page(items))
    }

    pub(crate) async fn commit_author_page(
        &self,
        repo: &RepoId,
        first: u32,
        after: Option<&str>,
    ) -> Result<Page<String>, GithubError> {
        let query = r#"
            query CommitAuthors($owner: String!, $name: String!, $first: Int!, $after: String) {
              repository(owner: $owner, name: $name) {
                defaultBranchRef {
                  target {
                    ... on Commit {
                      history(first: $first, after: $after) {
                        pageInfo { endCursor hasNextPage }
                        nodes { author { user { login } } }
                      }
                    }
                  }
                }
              }
            }
        "#;
        let vars = HistoryVars {
            owner: repo.owner(),
            name: repo.name(),
            first,
            after,
        };
        let data: HistoryResponse = self.graphql(query, vars).await?;
        let repository = data.repository.ok_or(GithubError::MissingData("repository"))?;
        // an empty repository has no default branch and therefore no contributors
        let Some(history) = repository
            .default_branch_ref
            .and_then(|branch| branch.target)
            .and_then(|target| target.history)
        else {
            return Ok(Page::last(Vec::new()));
        };
        let logins = history
            .nodes
            .into_iter()
            .filter_map(|commit| commit.author?.user.map(|user| user.login))
            .collect();
        Ok(history.page_info.into_page(logins))
    }

    async fn graphql<T, V>(&self, query: &str, variables: V) -> Result<T, GithubError>
    where
        T: DeserializeOwned,
        V: Serialize,
    {
        let request = GraphqlRequest { query, variables };
        self.retry.run(|| self.send(&request)).await
    }

    async fn send<T, V>(&self, request: &GraphqlRequest<'_, V>) -> Result<T, GithubError>
    where
        T: DeserializeOwned,
        V: Serialize,
    {
        let response = self
            .http
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
            .json(request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let quota_exhausted = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|value| value.to_str().ok())
                == Some("0");
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, quota_exhausted, body));
        }
        let body = response.text().await?;
        let payload: GraphqlResponse<T> = serde_json::from_str(&body)?;
        if let Some(errors) = payload.errors.filter(|errors| !errors.is_empty()) {
            let rate_limited = errors
                .iter()
                .any(|err| err.kind.as_deref() == Some(RATE_LIMITED_TYPE));
            let message = errors
                .into_iter()
                .map(|err| err.message)
                .collect::<Vec<_>>()
                .join(", ");
            if rate_limited {
                return Err(GithubError::RateLimited(message));
            }
            return Err(GithubError::Graphql(message));
        }
        payload.data.ok_or(GithubError::MissingData("graphql data"))
    }
}

fn exceeds_search_limit(total: u64) -> bool {
    total > SEARCH_RESULT_LIMIT
}

fn classify_status(status: StatusCode, quota_exhausted: bool, body: String) -> GithubError {
    if status == StatusCode::UNAUTHORIZED {
        return GithubError::Unauthorized(body);
    }
    let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
        || (status == StatusCode::FORBIDDEN
            && (quota_exhausted || body.to_ascii_lowercase().contains("rate limit")));
    if rate_limited {
        return GithubError::RateLimited(body);
    }
    GithubError::Status {
        status: status.as_u16(),
        body,
    }
}

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a, V> {
    query: &'a str,
    variables: V,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphqlErrorItem>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorItem {
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    end_cursor: Option<String>,
    has_next_page: bool,
}

impl PageInfo {
    fn next_cursor(self) -> Option<String> {
        if self.has_next_page {
            self.end_cursor
        } else {
            None
        }
    }

    fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page::new(items, self.has_next_page, self.end_cursor)
    }
}

#[derive(Debug, Serialize)]
struct SearchVars<'a> {
    query: &'a str,
    first: u32,
    after: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    search: SearchResult,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    discussion_count: u64,
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<Option<DiscussionNode>>,
}

#[derive(Debug, Serialize)]
struct DiscussionVars<'a> {
    owner: &'a str,
    name: &'a str,
    number: i32,
    first: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct DiscussionResponse<N> {
    repository: Option<RepositoryNode<N>>,
}

#[derive(Debug, Deserialize)]
struct RepositoryNode<N> {
    discussion: Option<N>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscussionNode {
    id: String,
    number: i32,
    title: String,
    url: String,
    created_at: String,
    updated_at: String,
    author: Option<AuthorNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscussionDetailNode {
    #[serde(flatten)]
    discussion: DiscussionNode,
    body_text: Option<String>,
    #[serde(default)]
    locked: bool,
    category: Option<CategoryNode>,
    answer: Option<IgnoredAny>,
    labels: Option<LabelConnection>,
    comments: CommentConnection,
}

#[derive(Debug, Deserialize)]
struct CommentsOnlyNode {
    comments: CommentConnection,
}

#[derive(Debug, Deserialize)]
struct CategoryNode {
    name: String,
}

#[derive(Debug, Deserialize)]
struct LabelConnection {
    #[serde(default)]
    nodes: Vec<Option<LabelNode>>,
}

#[derive(Debug, Deserialize)]
struct LabelNode {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentConnection {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<CommentNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentNode {
    #[serde(flatten)]
    fields: ReplyNode,
    replies: ReplyConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplyConnection {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<ReplyNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplyNode {
    id: String,
    body_text: Option<String>,
    created_at: String,
    updated_at: String,
    #[serde(default)]
    is_minimized: bool,
    minimized_reason: Option<String>,
    author: Option<AuthorNode>,
}

#[derive(Debug, Deserialize)]
struct AuthorNode {
    login: Option<String>,
}

#[derive(Debug, Serialize)]
struct NodeVars<'a> {
    id: &'a str,
    first: u32,
    after: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct ReplyNodeResponse {
    node: Option<ReplyHolder>,
}

#[derive(Debug, Deserialize)]
struct ReplyHolder {
    replies: Option<ReplyConnection>,
}

#[derive(Debug, Serialize)]
struct HistoryVars<'a> {
    owner: &'a str,
    name: &'a str,
    first: u32,
    after: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    repository: Option<HistoryRepository>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRepository {
    default_branch_ref: Option<BranchRef>,
}

#[derive(Debug, Deserialize)]
struct BranchRef {
    target: Option<CommitTarget>,
}

#[derive(Debug, Deserialize)]
struct CommitTarget {
    history: Option<CommitHistory>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommitHistory {
    page_info: PageInfo,
    #[serde(default)]
    nodes: Vec<CommitNode>,
}

#[derive(Debug, Deserialize)]
struct CommitNode {
    author: Option<CommitAuthor>,
}

#[derive(Debug, Deserialize)]
struct CommitAuthor {
    user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
struct UserNode {
    login: String,
}

impl DiscussionNode {
    fn into_summary(self) -> Result<DiscussionSummary, GithubError> {
        Ok(DiscussionSummary {
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
            id: self.id,
            number: self.number,
            title: self.title,
            url: self.url,
            author_login: self.author.and_then(|author| author.login),
        })
    }
}

impl DiscussionDetailNode {
    fn into_head(self) -> Result<DiscussionHead, GithubError> {
        let summary = self.discussion.into_summary()?;
        let labels = self
            .labels
            .map(|labels| {
                labels
                    .nodes
                    .into_iter()
                    .flatten()
                    .map(|label| label.name)
                    .collect()
            })
            .unwrap_or_default();
        let discussion = Discussion {
            id: summary.id,
            number: summary.number,
            title: summary.title,
            url: summary.url,
            author_login: summary.author_login,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
            category: self.category.map(|category| category.name),
            body: self.body_text.unwrap_or_default(),
            locked: self.locked,
            answered: self.answer.is_some(),
            labels,
            comments: Vec::new(),
        };
        Ok(DiscussionHead {
            discussion,
            comments: self.comments.into_page()?,
        })
    }
}

impl CommentConnection {
    fn into_page(self) -> Result<Page<PendingComment>, GithubError> {
        let mut items = Vec::with_capacity(self.nodes.len());
        for node in self.nodes {
            items.push(map_comment(node)?);
        }
        Ok(self.page_info.into_page(items))
    }
}

fn map_comment(node: CommentNode) -> Result<PendingComment, GithubError> {
    let fields = map_reply(node.fields)?;
    let mut replies = Vec::with_capacity(node.replies.nodes.len());
    for reply in node.replies.nodes {
        replies.push(map_reply(reply)?);
    }
    let replies_cursor = node.replies.page_info.next_cursor();
    Ok(PendingComment {
        comment: Comment {
            id: fields.id,
            author_login: fields.author_login,
            body: fields.body,
            created_at: fields.created_at,
            updated_at: fields.updated_at,
            is_minimized: fields.is_minimized,
            minimized_reason: fields.minimized_reason,
            replies,
        },
        replies_cursor,
    })
}

fn map_reply(node: ReplyNode) -> Result<Reply, GithubError> {
    Ok(Reply {
        created_at: parse_datetime(&node.created_at)?,
        updated_at: parse_datetime(&node.updated_at)?,
        id: node.id,
        author_login: node.author.and_then(|author| author.login),
        body: node.body_text.unwrap_or_default(),
        is_minimized: node.is_minimized,
        minimized_reason: node.minimized_reason,
    })
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, GithubError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| GithubError::InvalidTimestamp(value.to_string()))
}
