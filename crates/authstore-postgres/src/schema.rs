//! Schema bootstrap.
//!
//! Creates the storage tables if they are missing. Links between tables
//! are plain values, not foreign keys: lineage pointers are pruned lazily
//! on load, so a dangling reference is expected state, not corruption.

use sqlx_core::query::query;

use authstore::StoreResult;

use crate::{PgPool, db_error};

const DDL: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS oauth_client (
        id TEXT PRIMARY KEY,
        secret TEXT NOT NULL,
        redirect_uri TEXT NOT NULL,
        meta JSONB NOT NULL DEFAULT '{}',
        created TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS oauth_authorize (
        code TEXT PRIMARY KEY,
        client_id TEXT NOT NULL,
        expires_in INTEGER NOT NULL,
        scopes TEXT NOT NULL DEFAULT '',
        redirect_uri TEXT NOT NULL DEFAULT '',
        state TEXT NOT NULL DEFAULT '',
        created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        extra JSONB NOT NULL DEFAULT '{}'
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS oauth_access (
        access_token TEXT PRIMARY KEY,
        client_id TEXT NOT NULL,
        authorize_code TEXT,
        previous TEXT,
        refresh_token TEXT,
        expires_in INTEGER NOT NULL,
        scopes TEXT NOT NULL DEFAULT '',
        redirect_uri TEXT NOT NULL DEFAULT '',
        created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        extra JSONB NOT NULL DEFAULT '{}',
        is_frozen BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
    r#"
    CREATE INDEX IF NOT EXISTS idx_oauth_access_refresh
        ON oauth_access(refresh_token) WHERE refresh_token IS NOT NULL
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS oauth_refresh (
        token TEXT PRIMARY KEY,
        access TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS oauth_client_user_authorized (
        client_id TEXT NOT NULL,
        username TEXT NOT NULL,
        created TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (client_id, username)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS oauth_scope (
        name TEXT PRIMARY KEY,
        label TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        is_default BOOLEAN NOT NULL DEFAULT FALSE
    )
    "#,
];

/// Create the storage tables and indexes if they do not exist.
///
/// Safe to call on every startup.
///
/// # Errors
///
/// Returns a database error if any statement fails.
pub async fn create_tables_if_not_exists(pool: &PgPool) -> StoreResult<()> {
    for stmt in DDL {
        query(stmt)
            .execute(pool)
            .await
            .map_err(|e| db_error("create tables", "schema", e))?;
    }
    Ok(())
}
