//! BloodHound ingestion schema (version 3) node shapes.
//!
//! Field order in these structs is the field order in the output documents.
//! Relationship lists that this tool does not populate are still declared
//! with their element types so consumers see the full schema.

use std::fmt;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::refs::EntityKind;

/// Schema version stamped into every document's `meta` block.
pub const SCHEMA_VERSION: u32 = 3;

// ---------------------------------------------------------------------------
// Collections and documents
// ---------------------------------------------------------------------------

/// The four output collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionKind {
    Users,
    Computers,
    Groups,
    Domains,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 4] = [Self::Users, Self::Computers, Self::Groups, Self::Domains];

    /// Key of the node array and value of `meta.type`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Computers => "computers",
            Self::Groups => "groups",
            Self::Domains => "domains",
        }
    }
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The `meta` block of an output document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(rename = "type")]
    pub kind: CollectionKind,
    pub count: usize,
    pub version: u32,
}

/// `{"<kind>": [nodes...], "meta": {...}}`.
#[derive(Debug)]
pub struct OutputDocument<'a, N> {
    pub kind: CollectionKind,
    pub nodes: &'a [N],
}

impl<'a, N> OutputDocument<'a, N> {
    pub fn new(kind: CollectionKind, nodes: &'a [N]) -> Self {
        Self { kind, nodes }
    }

    pub fn meta(&self) -> Meta {
        Meta {
            kind: self.kind,
            count: self.nodes.len(),
            version: SCHEMA_VERSION,
        }
    }
}

impl<N: Serialize> Serialize for OutputDocument<'_, N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry(self.kind.label(), self.nodes)?;
        map.serialize_entry("meta", &self.meta())?;
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Relationship entries
// ---------------------------------------------------------------------------

/// A typed reference to another principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "MemberId")]
    pub member_id: String,
    #[serde(rename = "MemberType")]
    pub member_type: EntityKind,
}

impl Member {
    pub fn new(member_id: impl Into<String>, member_type: EntityKind) -> Self {
        Self {
            member_id: member_id.into(),
            member_type,
        }
    }
}

/// An access-control entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Ace {
    #[serde(rename = "PrincipalSID")]
    pub principal_sid: String,
    pub principal_type: EntityKind,
    pub right_name: String,
    pub ace_type: String,
    pub is_inherited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SpnTarget {
    pub computer_sid: String,
    pub port: u16,
    pub service: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Session {
    pub user_id: String,
    pub computer_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Trust {
    pub target_domain_sid: String,
    pub target_domain_name: String,
    pub is_transitive: bool,
    pub trust_direction: i32,
    pub trust_type: i32,
    pub sid_filtering_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GpLink {
    pub is_enforced: bool,
    pub guid: String,
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProperties {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub objectid: String,
    pub distinguishedname: Option<String>,
    pub highvalue: bool,
    pub unconstraineddelegation: bool,
    pub passwordnotreqd: bool,
    pub enabled: bool,
    pub lastlogon: i64,
    pub lastlogontimestamp: i64,
    pub pwdlastset: i64,
    pub dontreqpreauth: bool,
    pub pwdneverexpires: bool,
    pub sensitive: bool,
    pub serviceprincipalnames: Vec<String>,
    pub hasspn: bool,
    pub displayname: Option<String>,
    /// Not populated in this version.
    pub email: Option<String>,
    /// Not populated in this version.
    pub title: Option<String>,
    /// Not populated in this version.
    pub homedirectory: Option<String>,
    pub description: Option<String>,
    /// Not populated in this version.
    pub userpassword: Option<String>,
    pub admincount: bool,
    /// Not populated in this version.
    pub sidhistory: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserNode {
    pub allowed_to_delegate: Vec<String>,
    pub object_identifier: String,
    pub primary_group_sid: Option<String>,
    pub properties: UserProperties,
    pub aces: Vec<Ace>,
    #[serde(rename = "SPNTargets")]
    pub spn_targets: Vec<SpnTarget>,
    #[serde(rename = "HasSIDHistory")]
    pub has_sid_history: Vec<Member>,
}

// ---------------------------------------------------------------------------
// Computers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputerProperties {
    pub name: Option<String>,
    pub objectid: String,
    pub domain: Option<String>,
    pub highvalue: bool,
    pub distinguishedname: Option<String>,
    pub unconstraineddelegation: bool,
    pub enabled: bool,
    pub haslaps: bool,
    pub lastlogontimestamp: i64,
    pub pwdlastset: i64,
    pub serviceprincipalnames: Vec<String>,
    pub description: Option<String>,
    pub operatingsystem: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComputerNode {
    pub object_identifier: String,
    pub allowed_to_act: Vec<Member>,
    pub primary_group_sid: Option<String>,
    pub local_admins: Vec<Member>,
    #[serde(rename = "PSRemoteUsers")]
    pub ps_remote_users: Vec<Member>,
    pub properties: ComputerProperties,
    pub remote_desktop_users: Vec<Member>,
    pub dcom_users: Vec<Member>,
    pub allowed_to_delegate: Vec<String>,
    pub sessions: Vec<Session>,
    pub aces: Vec<Ace>,
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupProperties {
    pub domain: Option<String>,
    pub objectid: String,
    pub highvalue: bool,
    pub name: Option<String>,
    pub distinguishedname: Option<String>,
    pub admincount: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupNode {
    pub object_identifier: String,
    pub properties: GroupProperties,
    pub members: Vec<Member>,
    pub aces: Vec<Ace>,
}

// ---------------------------------------------------------------------------
// Domains
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainProperties {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub highvalue: bool,
    pub objectid: Option<String>,
    pub distinguishedname: Option<String>,
    pub description: Option<String>,
    /// Raw `msds-behavior-version` value.
    pub functionallevel: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DomainNode {
    pub object_identifier: Option<String>,
    pub properties: DomainProperties,
    pub trusts: Vec<Trust>,
    pub aces: Vec<Ace>,
    pub links: Vec<GpLink>,
    pub users: Vec<String>,
    pub computers: Vec<String>,
    pub child_ous: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_envelope() {
        let members = vec![Member::new("S-1-5-21-1-2-3-512", EntityKind::Group)];
        let doc = OutputDocument::new(CollectionKind::Groups, &members);
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            value,
            json!({
                "groups": [{"MemberId": "S-1-5-21-1-2-3-512", "MemberType": "Group"}],
                "meta": {"type": "groups", "count": 1, "version": 3}
            })
        );
    }

    #[test]
    fn test_empty_document() {
        let nodes: Vec<GroupNode> = Vec::new();
        let text = serde_json::to_string(&OutputDocument::new(CollectionKind::Domains, &nodes)).unwrap();
        assert_eq!(
            text,
            r#"{"domains":[],"meta":{"type":"domains","count":0,"version":3}}"#
        );
    }

    #[test]
    fn test_computer_node_keys() {
        let node = ComputerNode {
            object_identifier: "S-1-5-21-1-2-3-1105".into(),
            allowed_to_act: vec![],
            primary_group_sid: None,
            local_admins: vec![],
            ps_remote_users: vec![],
            properties: ComputerProperties {
                name: None,
                objectid: "S-1-5-21-1-2-3-1105".into(),
                domain: None,
                highvalue: false,
                distinguishedname: None,
                unconstraineddelegation: false,
                enabled: true,
                haslaps: false,
                lastlogontimestamp: -1,
                pwdlastset: -1,
                serviceprincipalnames: vec![],
                description: None,
                operatingsystem: None,
            },
            remote_desktop_users: vec![],
            dcom_users: vec![],
            allowed_to_delegate: vec![],
            sessions: vec![],
            aces: vec![],
        };
        let value = serde_json::to_value(&node).unwrap();
        let obj = value.as_object().unwrap();
        for key in [
            "ObjectIdentifier",
            "AllowedToAct",
            "PrimaryGroupSid",
            "LocalAdmins",
            "PSRemoteUsers",
            "Properties",
            "RemoteDesktopUsers",
            "DcomUsers",
            "AllowedToDelegate",
            "Sessions",
            "Aces",
        ] {
            assert!(obj.contains_key(key), "missing {key}");
        }
        assert_eq!(obj["Properties"]["lastlogontimestamp"], json!(-1));
    }
}
