//! Index tags attached to documents written to content-addressed storage

use super::{Community, Proposal, Vote};
use crate::types::DataType;
use std::collections::BTreeMap;

/// Application name written to every stored document
pub const APP_NAME: &str = "voty";
/// Application version written to every stored document
pub const APP_VERSION: &str = "0.0.0";

/// Ordered `name → value` tags of a stored document
pub type StorageTags = BTreeMap<String, String>;

/// Documents that can be written to storage
pub trait Taggable {
    /// Kind of document
    const DATA_TYPE: DataType;

    /// Tags identifying the document's parents for indexing
    fn index_tags(&self) -> Vec<(&'static str, String)>;
}

impl Taggable for Community {
    const DATA_TYPE: DataType = DataType::Community;

    fn index_tags(&self) -> Vec<(&'static str, String)> {
        vec![("app-index-entry", self.entry.to_string())]
    }
}

impl Taggable for Proposal {
    const DATA_TYPE: DataType = DataType::Proposal;

    fn index_tags(&self) -> Vec<(&'static str, String)> {
        vec![
            ("app-index-community", self.community.to_string()),
            ("app-index-workgroup", self.workgroup.clone()),
        ]
    }
}

impl Taggable for Vote {
    const DATA_TYPE: DataType = DataType::Vote;

    fn index_tags(&self) -> Vec<(&'static str, String)> {
        vec![("app-index-proposal", self.proposal.to_string())]
    }
}

/// Full tag set for storing `document`
pub fn storage_tags<T: Taggable>(document: &T) -> StorageTags {
    let mut tags = StorageTags::new();
    tags.insert("content-type".into(), "application/json".into());
    tags.insert("app-name".into(), APP_NAME.into());
    tags.insert("app-version".into(), APP_VERSION.into());
    tags.insert("app-data-type".into(), T::DATA_TYPE.to_string());
    for (name, value) in document.index_tags() {
        tags.insert(name.into(), value);
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Choice;
    use crate::types::Permalink;

    #[test]
    fn test_vote_tags() {
        let vote = Vote {
            proposal: Permalink::from_id("abc").unwrap(),
            choice: Choice::Single(0),
            power: 1.0,
        };
        let tags = storage_tags(&vote);
        assert_eq!(tags["app-name"], "voty");
        assert_eq!(tags["app-data-type"], "vote");
        assert_eq!(tags["app-index-proposal"], "ar://abc");
        assert_eq!(tags["content-type"], "application/json");
    }
}
