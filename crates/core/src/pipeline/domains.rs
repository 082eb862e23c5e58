//! Domains pipeline: `domain_trusts.json` -> `domains.json`.

use tracing::{debug, info, warn};

use super::Collection;
use crate::bloodhound::{CollectionKind, DomainNode, DomainProperties};
use crate::directory::normalize;
use crate::directory::RawEntity;
use crate::sid;

pub fn convert(entities: &[RawEntity]) -> Collection<DomainNode> {
    info!(records = entities.len(), "converting domains");
    let mut out = Collection::new(CollectionKind::Domains);
    for (index, entity) in entities.iter().enumerate() {
        let node = normalize_domain(entity);
        match node.object_identifier.clone() {
            Some(object_id) => {
                if !out.push_unique(&object_id, node) {
                    warn!(index, object_id = %object_id, "skipping duplicate domain");
                }
            }
            None => out.nodes.push(node),
        }
    }
    info!(count = out.count(), skipped = out.skipped, "domains converted");
    out
}

/// Decode the `securityIdentifier` wrapper. Anything other than a base64
/// wrapper holding a well-formed SID yields `None`.
pub fn security_identifier(entity: &RawEntity) -> Option<String> {
    entity
        .first("securityIdentifier")
        .filter(|v| v.is_object())
        .and_then(sid::from_value)
}

/// Build a domain node. An undecodable identifier leaves `ObjectIdentifier`
/// null; such domains are always kept, and only repeats of a decoded
/// identifier are dropped.
pub fn normalize_domain(entity: &RawEntity) -> DomainNode {
    let object_id = security_identifier(entity);
    if object_id.is_none() {
        debug!(dn = ?entity.distinguished_name(), "domain has no decodable security identifier");
    }

    let properties = DomainProperties {
        name: entity.first_str("name").map(str::to_uppercase),
        domain: entity.first_str("cn").map(str::to_uppercase),
        highvalue: true,
        objectid: object_id.clone(),
        distinguishedname: entity
            .distinguished_name()
            .map(|dn| normalize::sanitize(&dn.to_uppercase())),
        description: normalize::sanitize_opt(entity.first_str("description")),
        functionallevel: entity.first("msds-behavior-version").cloned(),
    };

    DomainNode {
        object_identifier: object_id,
        properties,
        trusts: Vec::new(),
        aces: Vec::new(),
        links: Vec::new(),
        users: Vec::new(),
        computers: Vec::new(),
        child_ous: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::Engine;
    use serde_json::json;

    const PARTNER_SID: [u8; 24] = [
        1, 4, 0, 0, 0, 0, 0, 5, // S-1-5
        21, 0, 0, 0, // 21
        1, 0, 0, 0, // 1
        2, 0, 0, 0, // 2
        3, 0, 0, 0, // 3
    ];

    fn trust(encoding: &str, encoded: &str) -> RawEntity {
        RawEntity::from_attributes(json!({
            "name": ["partner.example.org"],
            "cn": ["partner.example.org"],
            "distinguishedName": ["CN=partner.example.org,CN=System,DC=example,DC=com"],
            "securityIdentifier": [{"encoding": encoding, "encoded": encoded}],
            "msds-behavior-version": [7],
        }))
    }

    #[test]
    fn test_base64_identifier() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(PARTNER_SID);
        let node = normalize_domain(&trust("base64", &encoded));
        assert_eq!(node.object_identifier.as_deref(), Some("S-1-5-21-1-2-3"));
        assert_eq!(node.object_identifier, sid::decode(&PARTNER_SID));
        assert_eq!(node.properties.objectid, node.object_identifier);
        assert_eq!(node.properties.name.as_deref(), Some("PARTNER.EXAMPLE.ORG"));
        assert_eq!(node.properties.domain.as_deref(), Some("PARTNER.EXAMPLE.ORG"));
        assert_eq!(
            node.properties.distinguishedname.as_deref(),
            Some("CN=PARTNER.EXAMPLE.ORG,CN=SYSTEM,DC=EXAMPLE,DC=COM")
        );
        assert!(node.properties.highvalue);
        assert_eq!(node.properties.functionallevel, Some(json!(7)));
    }

    #[test]
    fn test_unsupported_encoding_is_null() {
        let node = normalize_domain(&trust("hex", "010400000000000515000000"));
        assert_eq!(node.object_identifier, None);
        assert_eq!(node.properties.objectid, None);
    }

    #[test]
    fn test_identifier_does_not_leak_between_records() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(PARTNER_SID);
        let out = convert(&[trust("base64", &encoded), trust("utf-16", "xyz")]);
        assert_eq!(out.count(), 2);
        assert!(out.nodes[0].properties.objectid.is_some());
        assert_eq!(out.nodes[1].properties.objectid, None);
    }

    #[test]
    fn test_repeated_identifier_kept_once() {
        let encoded = base64::engine::general_purpose::STANDARD.encode(PARTNER_SID);
        let out = convert(&[
            trust("base64", &encoded),
            trust("base64", &encoded),
            trust("hex", "00"),
            trust("hex", "00"),
        ]);
        assert_eq!(out.count(), 3);
        assert_eq!(out.skipped, 1);
        assert_eq!(out.nodes[1].object_identifier, None);
        assert_eq!(out.nodes[2].object_identifier, None);
    }

    #[test]
    fn test_missing_attributes() {
        let node = normalize_domain(&RawEntity::default());
        assert_eq!(node.object_identifier, None);
        assert_eq!(node.properties.name, None);
        assert_eq!(node.properties.functionallevel, None);
    }
}
