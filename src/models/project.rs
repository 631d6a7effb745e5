use serde::{Deserialize, Serialize};

use super::{MemberRole, ProjectMemberWithUser};
use crate::error::{AppError, Result, msg};

/// Minimum project name length, in characters, after trimming.
pub const MIN_PROJECT_NAME_LEN: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub image_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A project as seen by one of its members.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithRole {
    #[serde(flatten)]
    pub project: Project,
    pub role: MemberRole,
}

/// A project with its full member list (edit view).
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetails {
    #[serde(flatten)]
    pub project: Project,
    pub role: MemberRole,
    pub members: Vec<ProjectMemberWithUser>,
}

/// Form body for project create/update.
///
/// `members_json` is the serialized selection from the member picker: a JSON
/// array of directory user IDs.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub members_json: Option<String>,
}

/// Validated project fields ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectInput {
    pub name: String,
    pub image_url: Option<String>,
    /// Distinct selected member IDs, in selection order.
    pub member_ids: Vec<String>,
}

impl ProjectForm {
    pub fn validate(&self) -> Result<ProjectInput> {
        let name = self.name.trim();
        if name.chars().count() < MIN_PROJECT_NAME_LEN {
            return Err(AppError::BadRequest(msg::PROJECT_NAME_TOO_SHORT.into()));
        }

        let mut member_ids: Vec<String> = Vec::new();
        for id in parse_member_ids(self.members_json.as_deref().unwrap_or("[]")) {
            if !member_ids.contains(&id) {
                member_ids.push(id);
            }
        }

        Ok(ProjectInput {
            name: name.to_string(),
            image_url: normalize_image_url(self.image_url.as_deref()),
            member_ids,
        })
    }
}

/// Blank URLs become `None`; anything not starting with `http` is dropped.
pub fn normalize_image_url(value: Option<&str>) -> Option<String> {
    let url = value.unwrap_or("").trim();
    if url.is_empty() || !url.starts_with("http") {
        return None;
    }
    Some(url.to_string())
}

/// Parse the `members_json` form field.
///
/// Keeps only non-empty string entries, in order. Malformed input yields an
/// empty list.
pub fn parse_member_ids(raw: &str) -> Vec<String> {
    let raw = if raw.trim().is_empty() { "[]" } else { raw };
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) if !s.is_empty() => Some(s),
                _ => None,
            })
            .collect(),
        Ok(_) => Vec::new(),
        Err(e) => {
            tracing::warn!("Failed to parse members_json: {}", e);
            Vec::new()
        }
    }
}
