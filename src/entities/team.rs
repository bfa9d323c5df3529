//! Team member record

use serde::{Deserialize, Serialize};

use crate::core::record::Record;

/// A delivery team member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub member_id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub role: String,

    /// Points per sprint this person can sustain
    pub avg_capacity_per_sprint: f64,
}

impl Record for TeamMember {
    const KIND: &'static str = "TeamMember";

    const REQUIRED_FIELDS: &'static [&'static str] = &["member_id", "avg_capacity_per_sprint"];
}

impl TeamMember {
    pub fn new(
        member_id: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
        avg_capacity_per_sprint: f64,
    ) -> Self {
        Self {
            member_id: member_id.into(),
            name: name.into(),
            role: role.into(),
            avg_capacity_per_sprint,
        }
    }
}

/// Find a member by id
pub fn find_member<'a>(team: &'a [TeamMember], member_id: &str) -> Option<&'a TeamMember> {
    team.iter().find(|m| m.member_id == member_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_member() {
        let team = vec![
            TeamMember::new("TM001", "Ada", "Backend", 14.0),
            TeamMember::new("TM002", "Lin", "Frontend", 12.0),
        ];
        assert_eq!(find_member(&team, "TM002").map(|m| m.name.as_str()), Some("Lin"));
        assert!(find_member(&team, "TM099").is_none());
    }
}
