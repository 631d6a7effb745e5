//! Prefixed ID generation for orderdesk entities.
//!
//! Format: `od_{entity}_{uuid_simple}` (32 hex chars, no hyphens).
//! Directory user IDs come from the identity provider and are not prefixed.

use uuid::Uuid;

/// All known entity prefixes for validation.
const ALL_PREFIXES: &[&str] = &["od_proj_", "od_pmem_", "od_so_"];

/// Validate that a string is a well-formed orderdesk ID.
///
/// Rejects garbage before it reaches the database.
pub fn is_valid_prefixed_id(s: &str) -> bool {
    let Some(prefix) = ALL_PREFIXES.iter().find(|p| s.starts_with(*p)) else {
        return false;
    };

    let hex_part = &s[prefix.len()..];
    hex_part.len() == 32 && hex_part.chars().all(|c| c.is_ascii_hexdigit())
}

/// Validate that `s` is an ID for the given entity type.
pub fn is_valid_id_for(entity: EntityType, s: &str) -> bool {
    s.starts_with(entity.prefix())
        && s[entity.prefix().len()..].starts_with('_')
        && is_valid_prefixed_id(s)
}

#[derive(Debug, Clone, Copy)]
pub enum EntityType {
    Project,
    ProjectMember,
    ServiceOrder,
}

impl EntityType {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Project => "od_proj",
            Self::ProjectMember => "od_pmem",
            Self::ServiceOrder => "od_so",
        }
    }

    pub fn gen_id(&self) -> String {
        format!("{}_{}", self.prefix(), Uuid::new_v4().as_simple())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_format() {
        let id = EntityType::Project.gen_id();
        assert!(id.starts_with("od_proj_"));
        // od_proj_ (8 chars) + 32 hex chars
        assert_eq!(id.len(), 40);
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(EntityType::ServiceOrder.gen_id(), EntityType::ServiceOrder.gen_id());
    }

    #[test]
    fn test_is_valid_prefixed_id() {
        assert!(is_valid_prefixed_id("od_proj_a1b2c3d4e5f6789012345678901234ab"));
        assert!(is_valid_prefixed_id("od_so_00000000000000000000000000000000"));
        assert!(is_valid_prefixed_id(&EntityType::ProjectMember.gen_id()));

        assert!(!is_valid_prefixed_id(""));
        assert!(!is_valid_prefixed_id("42"));
        assert!(!is_valid_prefixed_id("od_usr_a1b2c3d4e5f6789012345678901234ab"));
        assert!(!is_valid_prefixed_id("od_so_a1b2c3d4"));
        assert!(!is_valid_prefixed_id("od_so_a1b2c3d4e5f6789012345678901234gg"));
    }

    #[test]
    fn test_is_valid_id_for_entity() {
        let order_id = EntityType::ServiceOrder.gen_id();
        assert!(is_valid_id_for(EntityType::ServiceOrder, &order_id));
        assert!(!is_valid_id_for(EntityType::Project, &order_id));
    }
}
