pub mod discussion;
pub mod document;
pub mod filter;

pub use discussion::{Comment, Discussion, DiscussionSummary, Reply};
pub use document::{AggregateDocument, render_discussion};
pub use filter::{ContributorSet, DiscussionFilter};
