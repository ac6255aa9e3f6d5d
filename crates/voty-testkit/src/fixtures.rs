//! Document fixtures

use serde_json::json;
use voty_core::documents::Duration;
use voty_core::{
    Choice, Community, Did, Permalink, Permission, PolicyNode, Proposal, SnapshotSet, Vote,
    VotingType, WeightNode, Workgroup,
};

/// Announcement phase of fixture workgroups
pub const ANNOUNCEMENT_SECS: u64 = 3600;
/// Voting phase of fixture workgroups
pub const VOTING_SECS: u64 = 86_400;

/// Policy admitting exactly `dids`
pub fn allow_dids(dids: &[&str]) -> PolicyNode {
    PolicyNode::or(vec![PolicyNode::and(vec![PolicyNode::predicate(
        "exact_did",
        vec![json!(dids)],
    )])])
}

/// Weight tree granting `power` to each of `dids`
pub fn fixed_power(dids: &[&str], power: f64) -> WeightNode {
    WeightNode::max(vec![WeightNode::leaf(
        "exact_did_fixed_power",
        vec![json!(dids), json!(power)],
    )])
}

/// Workgroup `id` with fixture phase lengths
pub fn workgroup(id: &str, proposing: PolicyNode, voting: WeightNode) -> Workgroup {
    Workgroup {
        id: id.to_string(),
        name: format!("Workgroup {id}"),
        duration: Duration {
            announcement: ANNOUNCEMENT_SECS,
            voting: VOTING_SECS,
        },
        permission: Permission { proposing, voting },
        extension: None,
    }
}

/// Community published under `entry`
pub fn community(entry: &Did, workgroups: Vec<Workgroup>) -> Community {
    Community {
        name: format!("Community of {entry}"),
        entry: entry.clone(),
        workgroups,
        extension: None,
    }
}

/// Single-choice proposal with two options
pub fn proposal(community: &Permalink, workgroup: &str, snapshots: SnapshotSet) -> Proposal {
    Proposal {
        community: community.clone(),
        workgroup: workgroup.to_string(),
        title: "Fund the grants round".into(),
        voting_type: VotingType::Single,
        options: vec!["Yes".into(), "No".into()],
        snapshots,
        extension: None,
    }
}

/// Vote for option 0 claiming `power`
pub fn vote(proposal: &Permalink, power: f64) -> Vote {
    Vote {
        proposal: proposal.clone(),
        choice: Choice::Single(0),
        power,
    }
}
