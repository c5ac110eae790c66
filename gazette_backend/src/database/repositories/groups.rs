use crate::database::models::GroupRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteGroupRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

fn map_group(row: &Row<'_>) -> rusqlite::Result<GroupRecord> {
    Ok(GroupRecord {
        id: row.get(0)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        created_at: row.get(4)?,
    })
}

impl<'conn> super::GroupRepository for SqliteGroupRepository<'conn> {
    fn create(&self, record: &GroupRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO groups (id, slug, title, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                record.id,
                record.slug,
                record.title,
                record.description,
                record.created_at
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<GroupRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, slug, title, description, created_at
                FROM groups
                WHERE id = ?1
                "#,
                params![id],
                map_group,
            )
            .optional()?)
    }

    fn get_by_slug(&self, slug: &str) -> Result<Option<GroupRecord>> {
        Ok(self
            .conn
            .query_row(
                r#"
                SELECT id, slug, title, description, created_at
                FROM groups
                WHERE slug = ?1
                "#,
                params![slug],
                map_group,
            )
            .optional()?)
    }

    fn list(&self) -> Result<Vec<GroupRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, slug, title, description, created_at
            FROM groups
            ORDER BY slug ASC
            "#,
        )?;
        let rows = stmt.query_map([], map_group)?;
        let mut groups = Vec::new();
        for row in rows {
            groups.push(row?);
        }
        Ok(groups)
    }
}
