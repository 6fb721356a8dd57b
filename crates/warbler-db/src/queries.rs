use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, Row, types::Type};
use uuid::Uuid;

use crate::Database;
use crate::error::Result;
use crate::models::{Message, User};

const USER_COLUMNS: &str =
    "u.id, u.email, u.username, u.password, u.image_url, u.header_image_url, u.bio, u.location";

const MESSAGE_COLUMNS: &str = "m.id, m.text, m.timestamp, m.user_id";

impl Database {
    // -- Users --

    pub fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.id = ?1");
            conn.query_row(&sql, [id.to_string()], user_from_row).optional()
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    /// All users, or those whose username contains `search`, ordered by username.
    pub fn list_users(&self, search: Option<&str>) -> Result<Vec<User>> {
        self.with_conn(|conn| match search.filter(|q| !q.is_empty()) {
            Some(q) => {
                let sql = format!(
                    "SELECT {USER_COLUMNS} FROM users u WHERE u.username LIKE ?1 ORDER BY u.username"
                );
                collect_users(conn, &sql, [format!("%{}%", q)])
            }
            None => {
                let sql = format!("SELECT {USER_COLUMNS} FROM users u ORDER BY u.username");
                collect_users(conn, &sql, rusqlite::params![])
            }
        })
    }

    // -- Follows --

    pub fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row(
                    "SELECT 1 FROM follows WHERE user_following_id = ?1 AND user_being_followed_id = ?2",
                    [follower_id.to_string(), followee_id.to_string()],
                    |_| Ok(()),
                )
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// Users following `user_id`.
    pub fn get_followers(&self, user_id: Uuid) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users u
                 JOIN follows f ON f.user_following_id = u.id
                 WHERE f.user_being_followed_id = ?1
                 ORDER BY u.username"
            );
            collect_users(conn, &sql, [user_id.to_string()])
        })
    }

    /// Users that `user_id` follows.
    pub fn get_following(&self, user_id: Uuid) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS} FROM users u
                 JOIN follows f ON f.user_being_followed_id = u.id
                 WHERE f.user_following_id = ?1
                 ORDER BY u.username"
            );
            collect_users(conn, &sql, [user_id.to_string()])
        })
    }

    // -- Messages --

    pub fn get_message(&self, id: Uuid) -> Result<Option<Message>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {MESSAGE_COLUMNS} FROM messages m WHERE m.id = ?1");
            conn.query_row(&sql, [id.to_string()], message_from_row).optional()
        })
    }

    /// Messages owned by `user_id`, newest first. `None` means no limit.
    pub fn get_user_messages(&self, user_id: Uuid, limit: Option<u32>) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages m
                 WHERE m.user_id = ?1
                 ORDER BY m.timestamp DESC, m.rowid DESC
                 LIMIT ?2"
            );
            let limit = limit.map(i64::from).unwrap_or(-1);
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id.to_string(), limit], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Home feed: messages by `user_id` and everyone they follow, newest first.
    pub fn timeline(&self, user_id: Uuid, limit: u32) -> Result<Vec<Message>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages m
                 WHERE m.user_id = ?1
                    OR m.user_id IN (
                        SELECT user_being_followed_id FROM follows WHERE user_following_id = ?1
                    )
                 ORDER BY m.timestamp DESC, m.rowid DESC
                 LIMIT ?2"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(rusqlite::params![user_id.to_string(), limit], message_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Fixtures --

    /// Removes every row from every table. Used to reset state between tests.
    pub fn delete_all(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(
                "DELETE FROM follows;
                 DELETE FROM messages;
                 DELETE FROM users;",
            )?;
            Ok(())
        })
    }
}

pub(crate) fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users u WHERE u.username = ?1");
    conn.query_row(&sql, [username], user_from_row).optional()
}

fn collect_users<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, user_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_column(row, 0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        password: row.get(3)?,
        image_url: row.get(4)?,
        header_image_url: row.get(5)?,
        bio: row.get(6)?,
        location: row.get(7)?,
    })
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: uuid_column(row, 0)?,
        text: row.get(1)?,
        timestamp: timestamp_column(row, 2)?,
        user_id: uuid_column(row, 3)?,
    })
}

fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Fixed-width RFC 3339 so that text ordering matches time ordering.
pub(crate) fn timestamp_to_sql(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
