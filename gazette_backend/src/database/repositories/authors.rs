use crate::database::models::AuthorRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteAuthorRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_author(row: &Row<'_>) -> rusqlite::Result<AuthorRecord> {
    Ok(AuthorRecord {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        bio: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl<'conn> super::AuthorRepository for SqliteAuthorRepository<'conn> {
    fn create(&self, record: &AuthorRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO authors (id, username, password_hash, bio, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.id,
                record.username,
                record.password_hash,
                record.bio,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<AuthorRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, username, password_hash, bio, created_at
                FROM authors
                WHERE id = ?1
                "#,
                params![id],
                map_author,
            )
            .optional()?)
    }

    fn get_by_username(&self, username: &str) -> Result<Option<AuthorRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, username, password_hash, bio, created_at
                FROM authors
                WHERE username = ?1
                "#,
                params![username],
                map_author,
            )
            .optional()?)
    }
}
