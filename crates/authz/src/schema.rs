/// Tables backing sessions and permission grants. Requires `accounts(id)`.
pub const SCHEMA: &str = r#"
    CREATE TABLE sessions (
        token      TEXT PRIMARY KEY NOT NULL,
        account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
        expires_at TEXT NOT NULL
    );
    CREATE INDEX sessions_account_idx ON sessions (account_id);

    CREATE TABLE permissions (
        codename TEXT PRIMARY KEY NOT NULL,
        name     TEXT NOT NULL
    );

    CREATE TABLE account_permissions (
        account_id INTEGER NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
        codename   TEXT NOT NULL REFERENCES permissions(codename) ON DELETE CASCADE,
        PRIMARY KEY (account_id, codename)
    );
"#;
