//! Groups pipeline: `domain_groups.json` -> `groups.json`.
//!
//! Membership is resolved against the [`ReferenceTable`]. Before any member
//! list is resolved every group in the collection is recorded, so forward
//! references to groups later in the same file resolve. The caller is
//! responsible for recording users beforehand (see
//! [`Converter`](crate::converter::Converter)).

use tracing::{debug, info, warn};

use super::Collection;
use crate::bloodhound::{CollectionKind, GroupNode, GroupProperties, Member};
use crate::directory::normalize::{self, NameStyle};
use crate::directory::RawEntity;
use crate::refs::ReferenceTable;

pub fn convert(entities: &[RawEntity], refs: &mut ReferenceTable) -> Collection<GroupNode> {
    info!(records = entities.len(), "converting groups");
    refs.record_groups(entities);

    let mut out = Collection::new(CollectionKind::Groups);
    for (index, entity) in entities.iter().enumerate() {
        match normalize_group(entity, refs) {
            Some((node, unresolved)) => {
                let object_id = node.object_identifier.clone();
                if out.push_unique(&object_id, node) {
                    out.unresolved_members += unresolved;
                } else {
                    warn!(index, object_id = %object_id, "skipping duplicate group");
                }
            }
            None => {
                warn!(index, dn = ?entity.distinguished_name(), "skipping group without objectSid");
                out.skipped += 1;
            }
        }
    }

    if out.unresolved_members > 0 {
        warn!(
            unresolved = out.unresolved_members,
            "dropped group member references not found among users or groups"
        );
    }
    info!(count = out.count(), skipped = out.skipped, "groups converted");
    out
}

/// Resolve a `member` DN list, in order. Returns the resolved members and
/// the number of references that were not in the table.
pub fn resolve_members(member_dns: &[String], refs: &ReferenceTable) -> (Vec<Member>, usize) {
    let mut members = Vec::with_capacity(member_dns.len());
    let mut unresolved = 0;
    for dn in member_dns {
        match refs.get(dn) {
            Some(r) => members.push(Member::new(r.object_id.clone(), r.kind)),
            None => {
                debug!(member = %dn, "unresolved group member reference");
                unresolved += 1;
            }
        }
    }
    (members, unresolved)
}

/// Build a group node with resolved members, or `None` when the record has
/// no usable SID.
pub fn normalize_group(entity: &RawEntity, refs: &ReferenceTable) -> Option<(GroupNode, usize)> {
    let object_id = entity.object_sid()?;
    let dn = entity.distinguished_name();
    let names = normalize::derive_name(
        entity.first_str("userPrincipalName"),
        dn,
        NameStyle::Principal,
    );
    let (members, unresolved) = resolve_members(&entity.strings("member"), refs);

    debug!(
        object_id = %object_id,
        members = members.len(),
        unresolved,
        "normalized group"
    );

    let properties = GroupProperties {
        domain: names.domain,
        objectid: object_id.clone(),
        highvalue: normalize::is_high_value_sid(&object_id),
        name: normalize::sanitize_opt(names.name.as_deref()),
        distinguishedname: normalize::sanitize_opt(dn),
        admincount: entity.first_int("adminCount").is_some_and(|v| v != 0),
        description: normalize::sanitize_opt(entity.first_str("description")),
    };

    let node = GroupNode {
        object_identifier: object_id,
        properties,
        members,
        aces: Vec::new(),
    };
    Some((node, unresolved))
}
