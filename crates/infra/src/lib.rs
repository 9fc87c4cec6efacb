pub mod github;
pub mod output;
