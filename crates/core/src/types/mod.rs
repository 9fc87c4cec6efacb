pub mod repo;
pub mod since;

pub use repo::RepoId;
pub use since::Since;
