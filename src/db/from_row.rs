//! Row mapping trait and helpers for reducing boilerplate in queries.
//!
//! Models implement `FromRow` to describe how they are built from a row
//! selected with the matching `*_COLS` constant.

use rusqlite::{Connection, OptionalExtension, Row, ToSql};

use crate::models::*;

/// Parse a string column into an enum type, converting parse errors to rusqlite errors.
///
/// Invalid values (from corruption or manual edits) surface as a query error
/// instead of a panic.
fn parse_enum<T: std::str::FromStr>(row: &Row, col: usize, col_name: &str) -> rusqlite::Result<T> {
    row.get::<_, String>(col)?.parse::<T>().map_err(|_| {
        rusqlite::Error::InvalidColumnType(col, col_name.to_string(), rusqlite::types::Type::Text)
    })
}

/// Trait for constructing a type from a database row.
pub trait FromRow: Sized {
    fn from_row(row: &Row) -> rusqlite::Result<Self>;
}

/// Query for a single optional result.
pub fn query_one<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Option<T>> {
    conn.query_row(sql, params, T::from_row)
        .optional()
        .map_err(Into::into)
}

/// Query for multiple results.
pub fn query_all<T: FromRow>(
    conn: &Connection,
    sql: &str,
    params: &[&dyn ToSql],
) -> crate::error::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, T::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ============ SQL SELECT Constants ============

pub const DIRECTORY_USER_COLS: &str = "id, email, name";

pub const PROJECT_COLS: &str = "id, name, image_url, created_at, updated_at";

/// Project columns plus the caller's role (`p` = projects, `pm` = project_members).
pub const PROJECT_WITH_ROLE_COLS: &str =
    "p.id, p.name, p.image_url, p.created_at, p.updated_at, pm.role";

pub const PROJECT_MEMBER_COLS: &str = "id, project_id, user_id, role, created_at";

/// Membership columns joined with the directory (`pm`, `u`).
pub const PROJECT_MEMBER_WITH_USER_COLS: &str = "pm.user_id, u.email, u.name, pm.role, pm.created_at";

pub const SERVICE_ORDER_COLS: &str =
    "id, name, price_cents, description, status, tag, delivery_date, created_at, updated_at";

// ============ FromRow Implementations ============

impl FromRow for DirectoryUser {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(DirectoryUser {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
        })
    }
}

impl FromRow for Project {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Project {
            id: row.get(0)?,
            name: row.get(1)?,
            image_url: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }
}

impl FromRow for ProjectWithRole {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ProjectWithRole {
            project: Project::from_row(row)?,
            role: parse_enum(row, 5, "role")?,
        })
    }
}

impl FromRow for ProjectMember {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ProjectMember {
            id: row.get(0)?,
            project_id: row.get(1)?,
            user_id: row.get(2)?,
            role: parse_enum(row, 3, "role")?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for ProjectMemberWithUser {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ProjectMemberWithUser {
            user_id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            role: parse_enum(row, 3, "role")?,
            created_at: row.get(4)?,
        })
    }
}

impl FromRow for ServiceOrder {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(ServiceOrder {
            id: row.get(0)?,
            name: row.get(1)?,
            price: Price::from_cents(row.get(2)?),
            description: row.get(3)?,
            status: parse_enum(row, 4, "status")?,
            tag: parse_enum(row, 5, "tag")?,
            delivery_date: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}
