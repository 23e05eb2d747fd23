//! User profiles keyed by id, with a username index.

use handshake_types::{ObservedUser, UserId, UserRecord};
use std::collections::{BTreeMap, HashMap};

/// Known users. `by_username` is derived from `by_id` and kept consistent on
/// every insert: each indexed username resolves to a record carrying it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserStore {
    by_id: BTreeMap<UserId, UserRecord>,
    by_username: HashMap<String, UserId>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from raw records (e.g. a loaded snapshot) and index usernames.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = UserRecord>,
    {
        let by_id = records.into_iter().map(|r| (r.id, r)).collect();
        let mut store = Self {
            by_id,
            by_username: HashMap::new(),
        };
        store.rebuild_index();
        store
    }

    /// Merge observed users. Observations without an id are skipped; present
    /// fields overwrite stored ones, absent fields leave them untouched.
    /// A username observed on a new id is taken away from its previous owner.
    /// Returns the number of records applied.
    pub fn merge<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = ObservedUser>,
    {
        let mut applied = 0;
        for observed in records {
            let Some(id) = observed.id else { continue };
            let record = self.by_id.entry(id).or_insert_with(|| UserRecord {
                id,
                username: None,
                full_name: None,
            });
            if let Some(full_name) = observed.full_name {
                record.full_name = Some(full_name);
            }
            if let Some(username) = observed.username {
                self.assign_username(id, username);
            }
            applied += 1;
        }
        applied
    }

    fn assign_username(&mut self, id: UserId, username: String) {
        let old = self
            .by_id
            .get_mut(&id)
            .and_then(|r| r.username.replace(username.clone()));
        if let Some(old) = old {
            if old != username && self.by_username.get(&old) == Some(&id) {
                self.by_username.remove(&old);
            }
        }
        if let Some(owner) = self.by_username.insert(username, id) {
            if owner != id {
                if let Some(previous) = self.by_id.get_mut(&owner) {
                    previous.username = None;
                }
            }
        }
    }

    /// Recompute the username index from `by_id`. When several records carry
    /// the same username the highest id keeps it and the others lose it.
    pub fn rebuild_index(&mut self) {
        self.by_username = self
            .by_id
            .values()
            .filter_map(|r| r.username.as_ref().map(|u| (u.clone(), r.id)))
            .collect();
        let index = &self.by_username;
        for record in self.by_id.values_mut() {
            let owned = record
                .username
                .as_ref()
                .map_or(true, |u| index.get(u) == Some(&record.id));
            if !owned {
                record.username = None;
            }
        }
    }

    pub fn resolve(&self, username: &str) -> Option<UserId> {
        self.by_username.get(username).copied()
    }

    pub fn get(&self, id: UserId) -> Option<&UserRecord> {
        self.by_id.get(&id)
    }

    pub fn username(&self, id: UserId) -> Option<&str> {
        self.by_id.get(&id).and_then(|r| r.username.as_deref())
    }

    /// `"Full Name (username)"`; missing parts render as empty strings.
    pub fn describe(&self, id: UserId) -> String {
        let record = self.by_id.get(&id);
        let full_name = record.and_then(|r| r.full_name.as_deref()).unwrap_or("");
        let username = record.and_then(|r| r.username.as_deref()).unwrap_or("");
        format!("{} ({})", full_name, username)
    }

    pub fn contains(&self, id: UserId) -> bool {
        self.by_id.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.by_id.keys().copied()
    }

    pub fn records(&self) -> impl Iterator<Item = &UserRecord> {
        self.by_id.values()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_indexes_usernames_and_skips_missing_ids() {
        let mut store = UserStore::new();
        let applied = store.merge(vec![
            ObservedUser::new(1, "alice", Some("Alice A")),
            ObservedUser {
                id: None,
                username: Some("ghost".to_string()),
                full_name: None,
            },
            ObservedUser {
                id: Some(2),
                username: None,
                full_name: Some("No Handle".to_string()),
            },
        ]);
        assert_eq!(applied, 2);
        assert_eq!(store.resolve("alice"), Some(1));
        assert_eq!(store.resolve("ghost"), None);
        assert_eq!(store.len(), 2);
        assert_eq!(store.username(2), None);
    }

    #[test]
    fn last_write_wins_per_field() {
        let mut store = UserStore::new();
        store.merge(vec![ObservedUser::new(1, "alice", Some("Alice A"))]);
        store.merge(vec![ObservedUser {
            id: Some(1),
            username: None,
            full_name: Some("Alice B".to_string()),
        }]);
        let rec = store.get(1).unwrap();
        assert_eq!(rec.username.as_deref(), Some("alice"));
        assert_eq!(rec.full_name.as_deref(), Some("Alice B"));
    }

    #[test]
    fn renamed_user_drops_stale_index_entry() {
        let mut store = UserStore::new();
        store.merge(vec![ObservedUser::new(1, "old_name", None)]);
        store.merge(vec![ObservedUser::new(1, "new_name", None)]);
        assert_eq!(store.resolve("old_name"), None);
        assert_eq!(store.resolve("new_name"), Some(1));
    }

    #[test]
    fn conflicting_username_goes_to_last_writer() {
        let mut store = UserStore::new();
        store.merge(vec![
            ObservedUser::new(1, "shared", None),
            ObservedUser::new(2, "shared", None),
        ]);
        assert_eq!(store.resolve("shared"), Some(2));
        assert_eq!(store.username(1), None);
    }

    #[test]
    fn taken_over_username_survives_reload() {
        let mut store = UserStore::new();
        store.merge(vec![ObservedUser::new(2, "shared", Some("Second"))]);
        store.merge(vec![ObservedUser::new(1, "shared", None)]);
        assert_eq!(store.resolve("shared"), Some(1));
        assert_eq!(store.username(2), None);
        assert_eq!(store.get(2).and_then(|r| r.full_name.as_deref()), Some("Second"));

        let reloaded = UserStore::from_records(store.records().cloned());
        assert_eq!(reloaded, store);
    }

    #[test]
    fn duplicate_usernames_in_records_are_resolved_on_load() {
        let store = UserStore::from_records(vec![
            UserRecord::new(3, Some("dup"), None),
            UserRecord::new(7, Some("dup"), None),
        ]);
        assert_eq!(store.resolve("dup"), Some(7));
        assert_eq!(store.username(3), None);
    }

    #[test]
    fn describe_degrades_to_empty_strings() {
        let mut store = UserStore::new();
        store.merge(vec![ObservedUser::new(1, "alice", Some("Alice A"))]);
        assert_eq!(store.describe(1), "Alice A (alice)");
        assert_eq!(store.describe(99), " ()");
    }

    #[test]
    fn from_records_rebuilds_index() {
        let store = UserStore::from_records(vec![
            UserRecord::new(5, Some("eve"), None),
            UserRecord::new(6, None, Some("Nameless")),
        ]);
        assert_eq!(store.resolve("eve"), Some(5));
        assert_eq!(store.len(), 2);
    }
}
