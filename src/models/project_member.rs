use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MemberRole {
    Owner,
    Member,
}

impl MemberRole {
    /// Deleting a project or removing its members is reserved to the owner.
    pub fn can_delete_project(&self) -> bool {
        matches!(self, MemberRole::Owner)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectMember {
    pub id: String,
    pub project_id: String,
    pub user_id: String,
    pub role: MemberRole,
    pub created_at: i64,
}

/// Membership joined with the member's directory entry.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectMemberWithUser {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
    pub role: MemberRole,
    pub created_at: i64,
}
