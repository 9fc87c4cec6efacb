mod graphql;
mod pages;
mod retry;

pub use graphql::{
    GRAPHQL_ENDPOINT, GithubClient, GithubError, ListingEntry, MalformedEntry, SEARCH_RESULT_LIMIT,
};
pub use pages::{DiscussionListing, MAX_PAGE_SIZE, search_query};
pub use retry::{IsRetryable, RetryPolicy};
