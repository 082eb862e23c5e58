//! Distinguished-name reference table.
//!
//! Group `member` attributes name their members by DN. [`ReferenceTable`]
//! maps each DN seen while walking users and groups to the object's SID and
//! kind so the groups pipeline can emit typed member entries. One table
//! lives for exactly one conversion run.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::directory::{normalize, RawEntity};

/// Kind of principal a DN resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    Computer,
    Group,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "User"),
            Self::Computer => write!(f, "Computer"),
            Self::Group => write!(f, "Group"),
        }
    }
}

/// A resolved reference: SID plus kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub object_id: String,
    pub kind: EntityKind,
}

/// DN -> (SID, kind). Keys are the raw, case-sensitive DNs from the dump.
#[derive(Debug, Default)]
pub struct ReferenceTable {
    entries: HashMap<String, Reference>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the entry for `dn`.
    pub fn put(&mut self, dn: impl Into<String>, object_id: impl Into<String>, kind: EntityKind) {
        self.entries.insert(
            dn.into(),
            Reference {
                object_id: object_id.into(),
                kind,
            },
        );
    }

    pub fn get(&self, dn: &str) -> Option<&Reference> {
        self.entries.get(dn)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a principal walked from the users collection. Machine accounts
    /// (short name or `sAMAccountName` ending in `$`) are tagged
    /// [`EntityKind::Computer`]. Returns `false` when the record has no DN or
    /// no SID.
    pub fn record_account(&mut self, entity: &RawEntity) -> bool {
        let (Some(dn), Some(object_id)) = (entity.distinguished_name(), entity.object_sid()) else {
            return false;
        };
        let kind = if is_machine_account(entity, dn) {
            EntityKind::Computer
        } else {
            EntityKind::User
        };
        self.put(dn, object_id, kind);
        true
    }

    /// Record a group walked from the groups collection.
    pub fn record_group(&mut self, entity: &RawEntity) -> bool {
        let (Some(dn), Some(object_id)) = (entity.distinguished_name(), entity.object_sid()) else {
            return false;
        };
        self.put(dn, object_id, EntityKind::Group);
        true
    }

    /// Pre-pass over a whole users collection.
    pub fn record_accounts(&mut self, entities: &[RawEntity]) {
        let recorded = entities.iter().filter(|e| self.record_account(e)).count();
        debug!(recorded, total = entities.len(), "recorded account references");
    }

    /// Pre-pass over a whole groups collection.
    pub fn record_groups(&mut self, entities: &[RawEntity]) {
        let recorded = entities.iter().filter(|e| self.record_group(e)).count();
        debug!(recorded, total = entities.len(), "recorded group references");
    }
}

fn is_machine_account(entity: &RawEntity, dn: &str) -> bool {
    normalize::leading_name(dn).is_some_and(|cn| cn.ends_with('$'))
        || entity
            .first_str("sAMAccountName")
            .is_some_and(|sam| sam.ends_with('$'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn account(dn: &str, sid: &str, sam: &str) -> RawEntity {
        RawEntity::from_attributes(json!({
            "distinguishedName": [dn],
            "objectSid": [sid],
            "sAMAccountName": [sam],
        }))
    }

    #[test]
    fn test_put_and_get() {
        let mut table = ReferenceTable::new();
        assert!(table.is_empty());
        table.put("CN=Bob,DC=X", "S-1-5-21-1-2-3-1104", EntityKind::User);
        let r = table.get("CN=Bob,DC=X").unwrap();
        assert_eq!(r.object_id, "S-1-5-21-1-2-3-1104");
        assert_eq!(r.kind, EntityKind::User);
        assert!(table.get("cn=bob,dc=x").is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let mut table = ReferenceTable::new();
        table.put("CN=A,DC=X", "S-1", EntityKind::User);
        table.put("CN=A,DC=X", "S-2", EntityKind::Group);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("CN=A,DC=X").unwrap().object_id, "S-2");
    }

    #[test]
    fn test_record_account_kinds() {
        let mut table = ReferenceTable::new();
        table.record_accounts(&[
            account("CN=Bob,OU=Users,DC=X", "S-1-5-21-1-2-3-1104", "bob"),
            account("CN=WEB01,OU=Servers,DC=X", "S-1-5-21-1-2-3-1105", "WEB01$"),
            account("CN=SVC$,OU=Users,DC=X", "S-1-5-21-1-2-3-1106", "svc"),
        ]);
        assert_eq!(table.get("CN=Bob,OU=Users,DC=X").unwrap().kind, EntityKind::User);
        assert_eq!(table.get("CN=WEB01,OU=Servers,DC=X").unwrap().kind, EntityKind::Computer);
        assert_eq!(table.get("CN=SVC$,OU=Users,DC=X").unwrap().kind, EntityKind::Computer);
    }

    #[test]
    fn test_record_skips_incomplete() {
        let mut table = ReferenceTable::new();
        let no_sid = RawEntity::from_attributes(json!({ "distinguishedName": ["CN=A,DC=X"] }));
        assert!(!table.record_account(&no_sid));
        assert!(!table.record_group(&RawEntity::default()));
        assert!(table.is_empty());
    }

    #[test]
    fn test_entity_kind_serializes_as_name() {
        assert_eq!(serde_json::to_string(&EntityKind::Computer).unwrap(), "\"Computer\"");
        assert_eq!(EntityKind::Group.to_string(), "Group");
    }
}
