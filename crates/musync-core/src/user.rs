//! User identity, credential and user-set types.

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::collections::btree_map;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable user key (`prefixed_id`), e.g. `email:alice@example.com`.
///
/// Never reused for a different logical user within a process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create an identity from an already prefixed key.
    #[inline]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build `"<prefix>:<value>"`.
    pub fn prefixed(prefix: &str, value: impl fmt::Display) -> Self {
        Self(format!("{prefix}:{value}"))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for UserId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Cipher method and secret a user connects with.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub method: String,
    pub secret: String,
}

impl Credential {
    pub fn new(method: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            secret: secret.into(),
        }
    }
}

// Keep secrets out of logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("method", &self.method)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// A user as declared by the panel or as configured on the local proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Stable identity.
    pub id: UserId,
    /// Numeric id the panel uses for traffic reports.
    pub panel_id: u64,
    pub credential: Credential,
    /// Port the user is served on.
    pub port: u16,
    /// Whether the user should be active at all.
    pub available: bool,
    /// Cumulative upload bytes as known to the reporter of this record.
    #[serde(default)]
    pub upload: u64,
    /// Cumulative download bytes as known to the reporter of this record.
    #[serde(default)]
    pub download: u64,
}

impl UserRecord {
    /// Create an available user with zero counters.
    pub fn new(id: impl Into<UserId>, panel_id: u64, credential: Credential, port: u16) -> Self {
        Self {
            id: id.into(),
            panel_id,
            credential,
            port,
            available: true,
            upload: 0,
            download: 0,
        }
    }

    /// Set the availability flag.
    #[inline]
    pub fn with_available(mut self, available: bool) -> Self {
        self.available = available;
        self
    }

    /// Two records are credential-equal iff method, secret and port match.
    ///
    /// Availability and counters are deliberately ignored.
    pub fn credential_eq(&self, other: &Self) -> bool {
        self.port == other.port && self.credential == other.credential
    }
}

/// Ordered identity → record map.
///
/// Used both for the panel's declared state and for the proxy's active set.
/// Ordering by identity keeps iteration (and therefore action order)
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserSet {
    users: BTreeMap<UserId, UserRecord>,
}

impl UserSet {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record keyed by its identity, returning the previous one.
    pub fn insert(&mut self, user: UserRecord) -> Option<UserRecord> {
        self.users.insert(user.id.clone(), user)
    }

    pub fn remove(&mut self, id: &str) -> Option<UserRecord> {
        self.users.remove(id)
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<&UserRecord> {
        self.users.get(id)
    }

    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.users.contains_key(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &UserId> {
        self.users.keys()
    }

    pub fn iter(&self) -> btree_map::Values<'_, UserId, UserRecord> {
        self.users.values()
    }

    /// Find the user currently holding `port`, if any.
    pub fn by_port(&self, port: u16) -> Option<&UserRecord> {
        self.users.values().find(|u| u.port == port)
    }
}

impl FromIterator<UserRecord> for UserSet {
    fn from_iter<I: IntoIterator<Item = UserRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        for user in iter {
            set.insert(user);
        }
        set
    }
}

impl IntoIterator for UserSet {
    type Item = UserRecord;
    type IntoIter = btree_map::IntoValues<UserId, UserRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.users.into_values()
    }
}

impl<'a> IntoIterator for &'a UserSet {
    type Item = &'a UserRecord;
    type IntoIter = btree_map::Values<'a, UserId, UserRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.users.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, secret: &str, port: u16) -> UserRecord {
        UserRecord::new(id, 1, Credential::new("aes-256-gcm", secret), port)
    }

    #[test]
    fn credential_eq_ignores_availability_and_counters() {
        let a = user("email:a", "pw", 10000);
        let mut b = a.clone().with_available(false);
        b.upload = 500;
        b.download = 700;
        assert!(a.credential_eq(&b));
    }

    #[test]
    fn credential_eq_detects_rotation() {
        let a = user("email:a", "pw", 10000);
        assert!(!a.credential_eq(&user("email:a", "other", 10000)));
        assert!(!a.credential_eq(&user("email:a", "pw", 10001)));

        let mut method = a.clone();
        method.credential.method = "chacha20-ietf-poly1305".into();
        assert!(!a.credential_eq(&method));
    }

    #[test]
    fn user_set_is_ordered_by_identity() {
        let set: UserSet = [user("email:c", "x", 3), user("email:a", "x", 1), user("email:b", "x", 2)]
            .into_iter()
            .collect();
        let ids: Vec<&str> = set.ids().map(UserId::as_str).collect();
        assert_eq!(ids, ["email:a", "email:b", "email:c"]);
        assert_eq!(set.by_port(2).map(|u| u.id.as_str()), Some("email:b"));
    }

    #[test]
    fn insert_replaces_same_identity() {
        let mut set = UserSet::new();
        assert!(set.insert(user("email:a", "old", 1)).is_none());
        let prev = set.insert(user("email:a", "new", 1)).unwrap();
        assert_eq!(prev.credential.secret, "old");
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("email:a").unwrap().credential.secret, "new");
    }

    #[test]
    fn credential_debug_redacts_secret() {
        let rendered = format!("{:?}", Credential::new("aes-256-gcm", "hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("aes-256-gcm"));
    }

    #[test]
    fn prefixed_identity() {
        assert_eq!(UserId::prefixed("id", 42).as_str(), "id:42");
    }
}
