mod from_row;
mod functions;
mod schema;
pub mod queries;

pub use functions::register_functions;
pub use schema::init_db;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::views::ViewCache;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Main database pool (projects, service orders, directory, sessions)
    pub db: DbPool,
    /// Cached listing renderings, invalidated by mutations
    pub views: ViewCache,
}

/// Connection manager with foreign keys on and the search functions registered.
pub fn connection_manager(manager: SqliteConnectionManager) -> SqliteConnectionManager {
    manager.with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        register_functions(conn)
    })
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = connection_manager(SqliteConnectionManager::file(database_path));
    Pool::builder().max_size(10).build(manager)
}
