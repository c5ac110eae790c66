use crate::database::models::PostRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqlitePostRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        id: row.get(0)?,
        author_id: row.get(1)?,
        group_id: row.get(2)?,
        text: row.get(3)?,
        image_path: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

const POST_COLUMNS: &str = "id, author_id, group_id, text, image_path, created_at, updated_at";

impl<'conn> SqlitePostRepository<'conn> {
    fn collect(&self, sql: &str, params: &[&dyn rusqlite::ToSql]) -> Result<Vec<PostRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, map_post)?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row?);
        }
        Ok(posts)
    }
}

impl<'conn> super::PostRepository for SqlitePostRepository<'conn> {
    fn create(&self, record: &PostRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO posts (id, author_id, group_id, text, image_path, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.id,
                record.author_id,
                record.group_id,
                record.text,
                record.image_path,
                record.created_at,
                record.updated_at
            ],
        )?;
        Ok(())
    }

    fn update(&self, record: &PostRecord) -> Result<()> {
        self.conn.execute(
            r#"
            UPDATE posts
            SET group_id = ?2, text = ?3, image_path = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
            params![
                record.id,
                record.group_id,
                record.text,
                record.image_path,
                record.updated_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PostRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                params![id],
                map_post,
            )
            .optional()?)
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        Ok(())
    }

    fn set_image_path(&self, id: &str, image_path: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE posts SET image_path = ?2 WHERE id = ?1",
            params![id, image_path],
        )?;
        Ok(())
    }

    fn list_recent(&self) -> Result<Vec<PostRecord>> {
        self.collect(
            &format!(
                r#"
                SELECT {POST_COLUMNS}
                FROM posts
                ORDER BY datetime(created_at) DESC, created_at DESC
                "#
            ),
            &[],
        )
    }

    fn list_for_group(&self, group_id: &str) -> Result<Vec<PostRecord>> {
        self.collect(
            &format!(
                r#"
                SELECT {POST_COLUMNS}
                FROM posts
                WHERE group_id = ?1
                ORDER BY datetime(created_at) DESC, created_at DESC
                "#
            ),
            &[&group_id],
        )
    }

    fn list_for_author(&self, author_id: &str) -> Result<Vec<PostRecord>> {
        self.collect(
            &format!(
                r#"
                SELECT {POST_COLUMNS}
                FROM posts
                WHERE author_id = ?1
                ORDER BY datetime(created_at) DESC, created_at DESC
                "#
            ),
            &[&author_id],
        )
    }

    fn list_followed(&self, follower_id: &str) -> Result<Vec<PostRecord>> {
        self.collect(
            r#"
            SELECT p.id, p.author_id, p.group_id, p.text, p.image_path, p.created_at, p.updated_at
            FROM posts p
            INNER JOIN follows f ON f.followed_id = p.author_id
            WHERE f.follower_id = ?1
            ORDER BY datetime(p.created_at) DESC, p.created_at DESC
            "#,
            &[&follower_id],
        )
    }
}
