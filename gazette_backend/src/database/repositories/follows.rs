use crate::database::models::FollowRecord;
use anyhow::Result;
use rusqlite::{params, Connection};

pub(super) struct SqliteFollowRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::FollowRepository for SqliteFollowRepository<'conn> {
    fn follow(&self, record: &FollowRecord) -> Result<()> {
        // OR IGNORE swallows both the duplicate-pair and the self-follow
        // CHECK violation, so re-follows and self-follows never error.
        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO follows (follower_id, followed_id, created_at)
            VALUES (?1, ?2, ?3)
            "#,
            params![record.follower_id, record.followed_id, record.created_at],
        )?;
        Ok(())
    }

    fn unfollow(&self, follower_id: &str, followed_id: &str) -> Result<()> {
        self.conn.execute(
            "DELETE FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
            params![follower_id, followed_id],
        )?;
        Ok(())
    }

    fn is_following(&self, follower_id: &str, followed_id: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ?1 AND followed_id = ?2",
            params![follower_id, followed_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn list_for_follower(&self, follower_id: &str) -> Result<Vec<FollowRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT follower_id, followed_id, created_at
            FROM follows
            WHERE follower_id = ?1
            ORDER BY datetime(created_at) DESC, created_at DESC
            "#,
        )?;
        let rows = stmt.query_map(params![follower_id], |row| {
            Ok(FollowRecord {
                follower_id: row.get(0)?,
                followed_id: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        let mut follows = Vec::new();
        for row in rows {
            follows.push(row?);
        }
        Ok(follows)
    }

    fn count_followers(&self, author_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE followed_id = ?1",
            params![author_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn count_following(&self, author_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM follows WHERE follower_id = ?1",
            params![author_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}
