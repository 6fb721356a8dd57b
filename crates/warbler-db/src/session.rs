use rusqlite::Connection;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::Database;
use crate::error::{DbError, Result};
use crate::models::{Follows, Message, User};
use crate::queries::timestamp_to_sql;

/// A write waiting for `Session::commit`.
#[derive(Debug, Clone)]
enum Staged {
    InsertUser(User),
    UpdateUser(User),
    DeleteUser(Uuid),
    InsertMessage(Message),
    DeleteMessage(Uuid),
    Follow(Follows),
    Unfollow(Follows),
}

impl Staged {
    fn apply(&self, conn: &Connection) -> Result<()> {
        match self {
            Staged::InsertUser(u) => {
                conn.execute(
                    "INSERT INTO users (id, email, username, password, image_url, header_image_url, bio, location)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    rusqlite::params![
                        u.id.to_string(),
                        u.email,
                        u.username,
                        u.password,
                        u.image_url,
                        u.header_image_url,
                        u.bio,
                        u.location,
                    ],
                )?;
            }
            Staged::UpdateUser(u) => {
                let changed = conn.execute(
                    "UPDATE users
                     SET email = ?2, username = ?3, password = ?4, image_url = ?5,
                         header_image_url = ?6, bio = ?7, location = ?8
                     WHERE id = ?1",
                    rusqlite::params![
                        u.id.to_string(),
                        u.email,
                        u.username,
                        u.password,
                        u.image_url,
                        u.header_image_url,
                        u.bio,
                        u.location,
                    ],
                )?;
                if changed == 0 {
                    return Err(DbError::NotFound("user"));
                }
            }
            Staged::DeleteUser(id) => {
                // messages and follows go with it via ON DELETE CASCADE
                conn.execute("DELETE FROM users WHERE id = ?1", [id.to_string()])?;
            }
            Staged::InsertMessage(m) => {
                conn.execute(
                    "INSERT INTO messages (id, text, timestamp, user_id) VALUES (?1, ?2, ?3, ?4)",
                    rusqlite::params![
                        m.id.to_string(),
                        m.text,
                        timestamp_to_sql(&m.timestamp),
                        m.user_id.to_string(),
                    ],
                )?;
            }
            Staged::DeleteMessage(id) => {
                conn.execute("DELETE FROM messages WHERE id = ?1", [id.to_string()])?;
            }
            Staged::Follow(edge) => {
                conn.execute(
                    "INSERT INTO follows (user_being_followed_id, user_following_id) VALUES (?1, ?2)",
                    [
                        edge.user_being_followed_id.to_string(),
                        edge.user_following_id.to_string(),
                    ],
                )?;
            }
            Staged::Unfollow(edge) => {
                conn.execute(
                    "DELETE FROM follows WHERE user_being_followed_id = ?1 AND user_following_id = ?2",
                    [
                        edge.user_being_followed_id.to_string(),
                        edge.user_following_id.to_string(),
                    ],
                )?;
            }
        }
        Ok(())
    }
}

/// Unit of work over a `Database`.
///
/// Writes are staged in memory and applied in a single SQLite transaction by
/// `commit`. Constraint failures surface there as `DbError::Integrity`. After
/// a failed commit the staged writes are kept and every further `commit`
/// returns `DbError::RollbackRequired` until `rollback` is called.
pub struct Session<'db> {
    db: &'db Database,
    staged: Vec<Staged>,
    failed: bool,
}

impl<'db> Session<'db> {
    pub(crate) fn new(db: &'db Database) -> Self {
        Self {
            db,
            staged: Vec::new(),
            failed: false,
        }
    }

    pub fn add_user(&mut self, user: User) {
        self.staged.push(Staged::InsertUser(user));
    }

    pub fn add_all_users(&mut self, users: impl IntoIterator<Item = User>) {
        self.staged.extend(users.into_iter().map(Staged::InsertUser));
    }

    pub fn update_user(&mut self, user: User) {
        self.staged.push(Staged::UpdateUser(user));
    }

    pub fn delete_user(&mut self, user_id: Uuid) {
        self.staged.push(Staged::DeleteUser(user_id));
    }

    pub fn add_message(&mut self, message: Message) {
        self.staged.push(Staged::InsertMessage(message));
    }

    pub fn delete_message(&mut self, message_id: Uuid) {
        self.staged.push(Staged::DeleteMessage(message_id));
    }

    /// Stages `follower_id` following `followee_id`. A duplicate edge fails at commit.
    pub fn follow(&mut self, follower_id: Uuid, followee_id: Uuid) {
        self.staged
            .push(Staged::Follow(Follows::new(follower_id, followee_id)));
    }

    /// Stages removal of the edge; removing an absent edge is a no-op.
    pub fn unfollow(&mut self, follower_id: Uuid, followee_id: Uuid) {
        self.staged
            .push(Staged::Unfollow(Follows::new(follower_id, followee_id)));
    }

    pub fn has_pending(&self) -> bool {
        !self.staged.is_empty()
    }

    pub fn commit(&mut self) -> Result<()> {
        if self.failed {
            return Err(DbError::RollbackRequired);
        }
        if self.staged.is_empty() {
            return Ok(());
        }

        let staged = &self.staged;
        let result = self.db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            for write in staged {
                write.apply(&tx)?;
            }
            tx.commit()?;
            Ok(())
        });

        match result {
            Ok(()) => {
                debug!("Committed {} staged write(s)", self.staged.len());
                self.staged.clear();
                Ok(())
            }
            Err(e) => {
                warn!("Commit failed, session needs rollback: {}", e);
                self.failed = true;
                Err(e)
            }
        }
    }

    /// Discards every staged write and clears a failed-commit state.
    pub fn rollback(&mut self) {
        if !self.staged.is_empty() {
            debug!("Rolled back {} staged write(s)", self.staged.len());
        }
        self.staged.clear();
        self.failed = false;
    }
}
