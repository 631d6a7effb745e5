use rusqlite::Connection;

/// Initialize the database schema.
pub fn init_db(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        -- Directory users (owned by the identity provider, read-only here)
        CREATE TABLE IF NOT EXISTS directory_users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            name TEXT,
            created_at INTEGER NOT NULL
        );

        -- Sessions issued by the identity provider (token stored hashed)
        CREATE TABLE IF NOT EXISTS auth_sessions (
            token_hash TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES directory_users(id) ON DELETE CASCADE,
            created_at INTEGER NOT NULL,
            expires_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_auth_sessions_user ON auth_sessions(user_id);

        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            image_url TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS project_members (
            id TEXT PRIMARY KEY,
            project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            user_id TEXT NOT NULL REFERENCES directory_users(id),
            role TEXT NOT NULL CHECK (role IN ('owner', 'member')),
            created_at INTEGER NOT NULL,
            UNIQUE(project_id, user_id)
        );
        CREATE INDEX IF NOT EXISTS idx_project_members_user ON project_members(user_id);
        -- At most one owner per project
        CREATE UNIQUE INDEX IF NOT EXISTS idx_project_members_owner
            ON project_members(project_id) WHERE role = 'owner';

        CREATE TABLE IF NOT EXISTS service_orders (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            price_cents INTEGER NOT NULL CHECK (price_cents >= 0),
            description TEXT,
            status TEXT NOT NULL CHECK (status IN ('in_progress', 'blocked', 'finished', 'ready_for_dev', 'canceled')),
            tag TEXT NOT NULL CHECK (tag IN ('SEO', 'DESIGN', 'CONFIG', 'FEATURE')),
            delivery_date TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_service_orders_status ON service_orders(status);
        "#,
    )
}
