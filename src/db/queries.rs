use chrono::Utc;
use rand::RngCore;
use rand::rngs::OsRng;
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params, types::Value};
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::id::EntityType;
use crate::models::*;
use crate::search::trigram::SIMILARITY_THRESHOLD;

use super::from_row::{
    DIRECTORY_USER_COLS, PROJECT_COLS, PROJECT_MEMBER_COLS, PROJECT_MEMBER_WITH_USER_COLS,
    PROJECT_WITH_ROLE_COLS, SERVICE_ORDER_COLS, query_all, query_one,
};

/// Maximum number of candidates returned by a directory search.
pub const SEARCH_PAGE_SIZE: i64 = 5;

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Builder for dynamic UPDATE statements.
/// Combines multiple field updates into a single query.
struct UpdateBuilder {
    table: &'static str,
    id: String,
    fields: Vec<(&'static str, Value)>,
    track_updated_at: bool,
}

impl UpdateBuilder {
    fn new(table: &'static str, id: &str) -> Self {
        Self {
            table,
            id: id.to_string(),
            fields: Vec::new(),
            track_updated_at: false,
        }
    }

    fn with_updated_at(mut self) -> Self {
        self.track_updated_at = true;
        self
    }

    fn set(mut self, column: &'static str, value: impl Into<Value>) -> Self {
        self.fields.push((column, value.into()));
        self
    }

    /// Set a column to an explicit value, `None` writing NULL.
    fn set_nullable<V: Into<Value>>(mut self, column: &'static str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.fields.push((column, v.into())),
            None => self.fields.push((column, Value::Null)),
        }
        self
    }

    fn execute(mut self, conn: &Connection) -> Result<bool> {
        if self.fields.is_empty() {
            return Ok(false);
        }
        if self.track_updated_at {
            self.fields.push(("updated_at", now().into()));
        }
        let sets: Vec<String> = self
            .fields
            .iter()
            .map(|(col, _)| format!("{} = ?", col))
            .collect();
        let mut values: Vec<Value> = self.fields.into_iter().map(|(_, v)| v).collect();
        values.push(self.id.into());
        let sql = format!("UPDATE {} SET {} WHERE id = ?", self.table, sets.join(", "));
        let affected = conn.execute(&sql, rusqlite::params_from_iter(values))?;
        Ok(affected > 0)
    }
}

// ============ Directory ============

/// Insert or refresh a directory entry.
///
/// The directory belongs to the identity provider; this exists for dev seeding
/// and tests.
pub fn upsert_directory_user(conn: &Connection, user: &DirectoryUser) -> Result<()> {
    conn.execute(
        "INSERT INTO directory_users (id, email, name, created_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (id) DO UPDATE SET email = excluded.email, name = excluded.name",
        params![&user.id, &user.email, &user.name, now()],
    )?;
    Ok(())
}

pub fn get_directory_user(conn: &Connection, id: &str) -> Result<Option<DirectoryUser>> {
    query_one(
        conn,
        &format!("SELECT {} FROM directory_users WHERE id = ?1", DIRECTORY_USER_COLS),
        &[&id],
    )
}

/// Returns the IDs from `ids` that have no directory entry, in input order.
pub fn find_missing_directory_ids(conn: &Connection, ids: &[String]) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT 1 FROM directory_users WHERE id = ?1")?;
    let mut missing = Vec::new();
    for id in ids {
        if !stmt.exists(params![id])? {
            missing.push(id.clone());
        }
    }
    Ok(missing)
}

/// Fuzzy directory search.
///
/// Matches a case-insensitive substring of email or name, or a trigram
/// similarity above the threshold. Ranked by the better of the two scores and
/// capped at [`SEARCH_PAGE_SIZE`]. Blank queries return nothing without
/// touching the database.
pub fn search_directory(conn: &Connection, query: &str) -> Result<Vec<DirectoryUser>> {
    let q = query.trim();
    if q.is_empty() {
        return Ok(Vec::new());
    }

    query_all(
        conn,
        &format!(
            "SELECT {} FROM directory_users
             WHERE icontains(email, ?1)
                OR (name IS NOT NULL AND icontains(name, ?1))
                OR similarity(email, ?1) > ?2
                OR (name IS NOT NULL AND similarity(name, ?1) > ?2)
             ORDER BY max(similarity(email, ?1), coalesce(similarity(name, ?1), 0)) DESC
             LIMIT ?3",
            DIRECTORY_USER_COLS
        ),
        params![q, SIMILARITY_THRESHOLD, SEARCH_PAGE_SIZE],
    )
}

// ============ Sessions ============

/// Hash a session token for lookup. SHA-256 with an application salt, lowercase hex.
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"orderdesk-session-v1:");
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn generate_session_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    format!("ods_{}", hex::encode(bytes))
}

/// Store a session for `user_id`, returning the plaintext bearer token.
///
/// Sessions are issued by the identity provider; this exists for dev seeding
/// and tests.
pub fn create_session(conn: &Connection, user_id: &str, ttl_secs: i64) -> Result<String> {
    let token = generate_session_token();
    let now = now();
    conn.execute(
        "INSERT INTO auth_sessions (token_hash, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        params![hash_session_token(&token), user_id, now, now + ttl_secs],
    )?;
    Ok(token)
}

/// Resolve a bearer token to the user it belongs to. Expired sessions resolve to `None`.
pub fn get_session_user_id(conn: &Connection, token: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT user_id FROM auth_sessions WHERE token_hash = ?1 AND expires_at > ?2",
        params![hash_session_token(token), now()],
        |row| row.get(0),
    )
    .optional()
    .map_err(Into::into)
}

// ============ Projects ============

/// Insert all membership rows in one multi-row statement.
/// Rows that already exist for `(project_id, user_id)` are left untouched.
fn insert_memberships(
    conn: &Connection,
    project_id: &str,
    members: &[(&str, MemberRole)],
    created_at: i64,
) -> Result<usize> {
    if members.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["(?, ?, ?, ?, ?)"; members.len()].join(", ");
    let mut values: Vec<Value> = Vec::with_capacity(members.len() * 5);
    for (user_id, role) in members {
        values.push(EntityType::ProjectMember.gen_id().into());
        values.push(project_id.to_string().into());
        values.push(user_id.to_string().into());
        values.push(role.as_ref().to_string().into());
        values.push(created_at.into());
    }

    let sql = format!(
        "INSERT INTO project_members (id, project_id, user_id, role, created_at) VALUES {}
         ON CONFLICT (project_id, user_id) DO NOTHING",
        placeholders
    );
    let inserted = conn.execute(&sql, rusqlite::params_from_iter(values))?;
    Ok(inserted)
}

/// Create a project and seed its memberships atomically.
///
/// The creator becomes the owner; every other distinct ID in
/// `input.member_ids` becomes a member.
pub fn create_project(conn: &mut Connection, creator_id: &str, input: &ProjectInput) -> Result<Project> {
    let id = EntityType::Project.gen_id();
    let now = now();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    tx.execute(
        "INSERT INTO projects (id, name, image_url, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![&id, &input.name, &input.image_url, now, now],
    )?;

    let mut members: Vec<(&str, MemberRole)> = vec![(creator_id, MemberRole::Owner)];
    members.extend(
        input
            .member_ids
            .iter()
            .filter(|m| m.as_str() != creator_id)
            .map(|m| (m.as_str(), MemberRole::Member)),
    );
    insert_memberships(&tx, &id, &members, now)?;

    tx.commit()?;

    Ok(Project {
        id,
        name: input.name.clone(),
        image_url: input.image_url.clone(),
        created_at: now,
        updated_at: now,
    })
}

pub fn get_project_by_id(conn: &Connection, id: &str) -> Result<Option<Project>> {
    query_one(
        conn,
        &format!("SELECT {} FROM projects WHERE id = ?1", PROJECT_COLS),
        &[&id],
    )
}

pub fn get_project_member(
    conn: &Connection,
    project_id: &str,
    user_id: &str,
) -> Result<Option<ProjectMember>> {
    query_one(
        conn,
        &format!(
            "SELECT {} FROM project_members WHERE project_id = ?1 AND user_id = ?2",
            PROJECT_MEMBER_COLS
        ),
        &[&project_id, &user_id],
    )
}

/// Projects `user_id` belongs to, newest first.
pub fn list_projects_for_user(conn: &Connection, user_id: &str) -> Result<Vec<ProjectWithRole>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM projects p
             INNER JOIN project_members pm ON pm.project_id = p.id
             WHERE pm.user_id = ?1
             ORDER BY p.created_at DESC, p.rowid DESC",
            PROJECT_WITH_ROLE_COLS
        ),
        &[&user_id],
    )
}

/// Members of a project, owner first, then in the order they were added.
pub fn list_project_members(conn: &Connection, project_id: &str) -> Result<Vec<ProjectMemberWithUser>> {
    query_all(
        conn,
        &format!(
            "SELECT {} FROM project_members pm
             INNER JOIN directory_users u ON u.id = pm.user_id
             WHERE pm.project_id = ?1
             ORDER BY CASE pm.role WHEN 'owner' THEN 0 ELSE 1 END, pm.created_at, pm.rowid",
            PROJECT_MEMBER_WITH_USER_COLS
        ),
        &[&project_id],
    )
}

/// Update name and image, and add any newly selected members.
///
/// Existing memberships are never removed or demoted here.
pub fn update_project(conn: &mut Connection, id: &str, input: &ProjectInput) -> Result<Option<Project>> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let updated = UpdateBuilder::new("projects", id)
        .with_updated_at()
        .set("name", input.name.clone())
        .set_nullable("image_url", input.image_url.clone())
        .execute(&tx)?;
    if !updated {
        return Ok(None);
    }

    let members: Vec<(&str, MemberRole)> = input
        .member_ids
        .iter()
        .map(|m| (m.as_str(), MemberRole::Member))
        .collect();
    insert_memberships(&tx, id, &members, now())?;

    let project = get_project_by_id(&tx, id)?;
    tx.commit()?;
    Ok(project)
}

/// Delete a project and all of its memberships.
pub fn delete_project(conn: &mut Connection, id: &str) -> Result<bool> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    tx.execute("DELETE FROM project_members WHERE project_id = ?1", params![id])?;
    let deleted = tx.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
    tx.commit()?;
    Ok(deleted > 0)
}

/// Remove a non-owner member. Returns false if no such member row exists.
pub fn remove_project_member(conn: &Connection, project_id: &str, user_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM project_members WHERE project_id = ?1 AND user_id = ?2 AND role = 'member'",
        params![project_id, user_id],
    )?;
    Ok(deleted > 0)
}

// ============ Service orders ============

pub fn create_service_order(conn: &Connection, input: &ServiceOrderInput) -> Result<ServiceOrder> {
    let id = EntityType::ServiceOrder.gen_id();
    let now = now();

    conn.execute(
        "INSERT INTO service_orders (id, name, price_cents, description, status, tag, delivery_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            &id,
            &input.name,
            input.price.cents(),
            &input.description,
            input.status.as_ref(),
            input.tag.as_ref(),
            input.delivery_date,
            now,
            now
        ],
    )?;

    Ok(ServiceOrder {
        id,
        name: input.name.clone(),
        price: input.price,
        description: input.description.clone(),
        status: input.status,
        tag: input.tag,
        delivery_date: input.delivery_date,
        created_at: now,
        updated_at: now,
    })
}

pub fn get_service_order_by_id(conn: &Connection, id: &str) -> Result<Option<ServiceOrder>> {
    query_one(
        conn,
        &format!("SELECT {} FROM service_orders WHERE id = ?1", SERVICE_ORDER_COLS),
        &[&id],
    )
}

/// Service orders, newest first, optionally restricted to one status.
pub fn list_service_orders(
    conn: &Connection,
    status: Option<ServiceOrderStatus>,
) -> Result<Vec<ServiceOrder>> {
    match status {
        Some(status) => query_all(
            conn,
            &format!(
                "SELECT {} FROM service_orders WHERE status = ?1 ORDER BY created_at DESC, rowid DESC",
                SERVICE_ORDER_COLS
            ),
            &[&status.as_ref()],
        ),
        None => query_all(
            conn,
            &format!(
                "SELECT {} FROM service_orders ORDER BY created_at DESC, rowid DESC",
                SERVICE_ORDER_COLS
            ),
            &[],
        ),
    }
}

pub fn count_service_orders_by_status(conn: &Connection) -> Result<StatusCounts> {
    let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM service_orders GROUP BY status")?;
    let pairs = stmt
        .query_map([], |row| {
            let status: ServiceOrderStatus = row.get::<_, String>(0)?.parse().map_err(|_| {
                rusqlite::Error::InvalidColumnType(0, "status".to_string(), rusqlite::types::Type::Text)
            })?;
            Ok((status, row.get::<_, i64>(1)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(StatusCounts::from_pairs(pairs))
}

/// Replace every editable field of a service order.
pub fn update_service_order(
    conn: &Connection,
    id: &str,
    input: &ServiceOrderInput,
) -> Result<Option<ServiceOrder>> {
    let updated = UpdateBuilder::new("service_orders", id)
        .with_updated_at()
        .set("name", input.name.clone())
        .set("price_cents", input.price.cents())
        .set_nullable("description", input.description.clone())
        .set("status", input.status.as_ref().to_string())
        .set("tag", input.tag.as_ref().to_string())
        .set_nullable(
            "delivery_date",
            input.delivery_date.map(|d| d.format("%Y-%m-%d").to_string()),
        )
        .execute(conn)?;
    if !updated {
        return Ok(None);
    }
    get_service_order_by_id(conn, id)
}

/// Change only the status of a service order.
pub fn update_service_order_status(
    conn: &Connection,
    id: &str,
    status: ServiceOrderStatus,
) -> Result<Option<ServiceOrder>> {
    let updated = UpdateBuilder::new("service_orders", id)
        .with_updated_at()
        .set("status", status.as_ref().to_string())
        .execute(conn)?;
    if !updated {
        return Ok(None);
    }
    get_service_order_by_id(conn, id)
}

pub fn delete_service_order(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM service_orders WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}
