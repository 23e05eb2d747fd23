//! SQLite-backed snapshot store.

use handshake_types::{Adjacency, GraphSnapshot, SnapshotError, SnapshotStore, UserRecord};
use std::path::Path;

/// Persists the snapshot in three tables. `crawled` keeps ids whose following
/// set was fetched, so crawled-but-empty users survive a round trip.
pub struct SqliteSnapshotStore {
    conn: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteSnapshotStore {
    /// Open (or create) the database at `path`.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| SnapshotError::Backend(e.to_string()))?;
        Self::init(conn)
    }

    /// In-memory database, mainly for tests.
    pub fn in_memory() -> Result<Self, SnapshotError> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| SnapshotError::Backend(e.to_string()))?;
        Self::init(conn)
    }

    fn init(conn: rusqlite::Connection) -> Result<Self, SnapshotError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                username TEXT,
                full_name TEXT
            );

            CREATE TABLE IF NOT EXISTS crawled (
                id INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS follows (
                from_id INTEGER NOT NULL,
                to_id INTEGER NOT NULL,
                PRIMARY KEY (from_id, to_id)
            );

            CREATE TABLE IF NOT EXISTS meta (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| SnapshotError::Backend(e.to_string()))?;

        Ok(Self {
            conn: std::sync::Mutex::new(conn),
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T, SnapshotError>
    where
        F: FnOnce(&rusqlite::Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| SnapshotError::Backend(format!("failed to acquire lock: {}", e)))?;
        f(&conn).map_err(|e| SnapshotError::Backend(e.to_string()))
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn save(&self, snapshot: &GraphSnapshot) -> Result<(), SnapshotError> {
        self.with_conn(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute_batch("DELETE FROM users; DELETE FROM crawled; DELETE FROM follows;")?;
            for user in &snapshot.users {
                tx.execute(
                    "INSERT INTO users (id, username, full_name) VALUES (?1, ?2, ?3)",
                    rusqlite::params![user.id as i64, user.username, user.full_name],
                )?;
            }
            for (from, targets) in &snapshot.edges {
                tx.execute(
                    "INSERT INTO crawled (id) VALUES (?1)",
                    rusqlite::params![*from as i64],
                )?;
                for to in targets {
                    tx.execute(
                        "INSERT INTO follows (from_id, to_id) VALUES (?1, ?2)",
                        rusqlite::params![*from as i64, *to as i64],
                    )?;
                }
            }
            tx.execute(
                "INSERT OR REPLACE INTO meta (key, value) VALUES ('saved_at', ?1)",
                rusqlite::params![snapshot.saved_at],
            )?;
            tx.commit()
        })
    }

    fn load(&self) -> Result<Option<GraphSnapshot>, SnapshotError> {
        self.with_conn(|conn| {
            let saved_at: Option<String> = conn
                .query_row("SELECT value FROM meta WHERE key = 'saved_at'", [], |row| {
                    row.get(0)
                })
                .map(Some)
                .or_else(|e| match e {
                    rusqlite::Error::QueryReturnedNoRows => Ok(None),
                    other => Err(other),
                })?;
            let Some(saved_at) = saved_at else {
                return Ok(None);
            };

            let mut stmt = conn.prepare("SELECT id, username, full_name FROM users ORDER BY id")?;
            let users = stmt
                .query_map([], |row| {
                    Ok(UserRecord {
                        id: row.get::<_, i64>(0)? as u64,
                        username: row.get(1)?,
                        full_name: row.get(2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut edges = Adjacency::new();
            let mut stmt = conn.prepare("SELECT id FROM crawled")?;
            for id in stmt.query_map([], |row| row.get::<_, i64>(0))? {
                edges.entry(id? as u64).or_default();
            }
            let mut stmt = conn.prepare("SELECT from_id, to_id FROM follows")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)? as u64, row.get::<_, i64>(1)? as u64))
            })?;
            for row in rows {
                let (from, to) = row?;
                edges.entry(from).or_default().insert(to);
            }

            Ok(Some(GraphSnapshot {
                users,
                edges,
                saved_at,
            }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SocialGraph;
    use handshake_types::FollowingPage;
    use handshake_types::ObservedUser;
    use std::collections::BTreeMap;

    #[test]
    fn empty_database_loads_as_none() {
        let store = SqliteSnapshotStore::in_memory().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let store = SqliteSnapshotStore::in_memory().unwrap();
        let mut g = SocialGraph::new();
        g.observe_following(FollowingPage {
            user: ObservedUser::new(1, "alice", Some("Alice")),
            following: vec![ObservedUser::new(2, "bob", None)],
        });
        g.observe_edges(BTreeMap::from([(2u64, Vec::<u64>::new())]));
        store.save(&g.snapshot()).unwrap();
        store.save(&g.snapshot()).unwrap();

        let restored = SocialGraph::restore(&store);
        assert_eq!(restored.users(), g.users());
        assert_eq!(restored.follows(), g.follows());
        assert!(!restored.is_dead_end(2));
    }
}
