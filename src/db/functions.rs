//! SQL scalar functions used by the directory search.
//!
//! SQLite has no trigram extension, so `similarity` and a Unicode-aware
//! `icontains` are registered on every pooled connection.

use rusqlite::Connection;
use rusqlite::functions::FunctionFlags;

use crate::search::trigram;

/// Register `similarity(a, b)` and `icontains(haystack, needle)`.
///
/// Both return NULL when either argument is NULL.
pub fn register_functions(conn: &Connection) -> rusqlite::Result<()> {
    let flags = FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC;

    conn.create_scalar_function("similarity", 2, flags, |ctx| {
        let a: Option<String> = ctx.get(0)?;
        let b: Option<String> = ctx.get(1)?;
        Ok(match (a, b) {
            (Some(a), Some(b)) => Some(trigram::similarity(&a, &b)),
            _ => None,
        })
    })?;

    conn.create_scalar_function("icontains", 2, flags, |ctx| {
        let haystack: Option<String> = ctx.get(0)?;
        let needle: Option<String> = ctx.get(1)?;
        Ok(match (haystack, needle) {
            (Some(h), Some(n)) => Some(h.to_lowercase().contains(&n.to_lowercase())),
            _ => None,
        })
    })?;

    Ok(())
}
