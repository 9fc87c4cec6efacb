use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::domain::discussion::Discussion;
use crate::types::since::Since;

/// Logins that authored at least one commit in the repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributorSet(HashSet<String>);

impl ContributorSet {
    pub fn contains(&self, login: &str) -> bool {
        self.0.contains(login)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ContributorSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl<S: Into<String>> Extend<S> for ContributorSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.0.extend(iter.into_iter().map(Into::into));
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiscussionFilter {
    since: Option<Since>,
    contributors: Option<ContributorSet>,
}

impl DiscussionFilter {
    pub fn new(since: Option<Since>, contributors: Option<ContributorSet>) -> Self {
        Self {
            since,
            contributors,
        }
    }

    pub fn since(&self) -> Option<&Since> {
        self.since.as_ref()
    }

    pub fn updated_since(&self, updated_at: DateTime<Utc>) -> bool {
        match self.since {
            Some(since) => updated_at >= since.threshold(),
            None => true,
        }
    }

    /// Always true without a contributor set; false for every discussion when the set is empty.
    pub fn involves_contributor(&self, discussion: &Discussion) -> bool {
        let Some(contributors) = self.contributors.as_ref() else {
            return true;
        };
        discussion
            .participants()
            .any(|login| contributors.contains(login))
    }

    pub fn accepts(&self, discussion: &Discussion) -> bool {
        self.updated_since(discussion.updated_at) && self.involves_contributor(discussion)
    }
}
