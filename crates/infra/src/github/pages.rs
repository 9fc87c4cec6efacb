use tracing::debug;

use crate::github::graphql::{GithubClient, GithubError, ListingEntry, PendingComment};
use harvest_core::domain::{ContributorSet, Discussion, Reply};
use harvest_core::pagination::{Page, PageSource, Paginator};
use harvest_core::types::{RepoId, Since};

pub const MAX_PAGE_SIZE: u32 = 100;

/// Search results over one repository's discussions, fetched a page at a time.
#[derive(Debug)]
pub struct DiscussionListing<'a> {
    client: &'a GithubClient,
    query: String,
    page_size: u32,
}

#[derive(Debug)]
struct CommentPages<'a> {
    client: &'a GithubClient,
    repo: &'a RepoId,
    number: i32,
}

#[derive(Debug)]
struct ReplyPages<'a> {
    client: &'a GithubClient,
    comment_id: String,
}

#[derive(Debug)]
struct CommitAuthorPages<'a> {
    client: &'a GithubClient,
    repo: &'a RepoId,
}

impl GithubClient {
    pub fn discussion_listing<'a>(
        &'a self,
        repo: &RepoId,
        since: Option<&Since>,
        page_size: u32,
    ) -> DiscussionListing<'a> {
        DiscussionListing {
            client: self,
            query: search_query(repo, since),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Fetches one discussion with every comment and reply, following nested cursors.
    pub async fn fetch_discussion(
        &self,
        repo: &RepoId,
        number: i32,
    ) -> Result<Discussion, GithubError> {
        let head = self.discussion_head(repo, number, MAX_PAGE_SIZE).await?;
        let mut discussion = head.discussion;
        let mut pending = head.comments.items;
        if let Some(cursor) = head.comments.next_cursor {
            debug!(number, "discussion has more comments, paging");
            let source = CommentPages {
                client: self,
                repo,
                number,
            };
            pending.extend(Paginator::resume(source, cursor).collect_all().await?);
        }

        discussion.comments.reserve(pending.len());
        for PendingComment {
            mut comment,
            replies_cursor,
        } in pending
        {
            if let Some(cursor) = replies_cursor {
                debug!(number, comment_id = %comment.id, "comment has more replies, paging");
                let source = ReplyPages {
                    client: self,
                    comment_id: comment.id.clone(),
                };
                let replies = Paginator::resume(source, cursor).collect_all().await?;
                comment.replies.extend(replies);
            }
            discussion.comments.push(comment);
        }
        Ok(discussion)
    }

    /// Logins of every commit author on the default branch.
    pub async fn fetch_contributors(&self, repo: &RepoId) -> Result<ContributorSet, GithubError> {
        let source = CommitAuthorPages { client: self, repo };
        let mut paginator = Paginator::new(source);
        let mut contributors = ContributorSet::default();
        while let Some(logins) = paginator.next_page().await? {
            contributors.extend(logins);
        }
        debug!(
            pages = paginator.pages_fetched(),
            contributors = contributors.len(),
            "commit history scanned"
        );
        Ok(contributors)
    }
}

pub fn search_query(repo: &RepoId, since: Option<&Since>) -> String {
    let mut query = format!("repo:{repo} is:discussion");
    if let Some(since) = since {
        query.push_str(&format!(" updated:>={}", since.date_floor().format("%Y-%m-%d")));
    }
    query
}

impl PageSource for DiscussionListing<'_> {
    type Item = ListingEntry;
    type Error = GithubError;

    async fn fetch_page(
        &mut self,
        after: Option<String>,
    ) -> Result<Page<ListingEntry>, GithubError> {
        self.client
            .search_discussions(&self.query, self.page_size, after.as_deref())
            .await
    }
}

impl PageSource for CommentPages<'_> {
    type Item = PendingComment;
    type Error = GithubError;

    async fn fetch_page(
        &mut self,
        after: Option<String>,
    ) -> Result<Page<PendingComment>, GithubError> {
        self.client
            .comment_page(self.repo, self.number, MAX_PAGE_SIZE, after.as_deref())
            .await
    }
}

impl PageSource for ReplyPages<'_> {
    type Item = Reply;
    type Error = GithubError;

    async fn fetch_page(&mut self, after: Option<String>) -> Result<Page<Reply>, GithubError> {
        self.client
            .reply_page(&self.comment_id, MAX_PAGE_SIZE, after.as_deref())
            .await
    }
}

impl PageSource for CommitAuthorPages<'_> {
    type Item = String;
    type Error = GithubError;

    async fn fetch_page(&mut self, after: Option<String>) -> Result<Page<String>, GithubError> {
        self.client
            .commit_author_page(self.repo, MAX_PAGE_SIZE, after.as_deref())
            .await
    }
}
