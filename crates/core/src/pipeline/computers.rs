//! Computers pipeline: `domain_computers.json` -> `computers.json`.

use tracing::{debug, info, warn};

use super::Collection;
use crate::bloodhound::{CollectionKind, ComputerNode, ComputerProperties, Member};
use crate::directory::normalize::{self, NameStyle};
use crate::directory::{AccountControl, AccountControlFlag, RawEntity};
use crate::refs::EntityKind;
use crate::sid;

/// Local administrators every computer is seeded with, as
/// `(RID, kind)` against the computer's domain prefix. This is a fixed
/// default rather than data read from the directory.
pub const LOCAL_ADMIN_SEED: [(u32, EntityKind); 3] = [
    (519, EntityKind::Group),
    (512, EntityKind::Group),
    (500, EntityKind::User),
];

/// Attributes whose presence means LAPS manages the local admin password.
const LAPS_ATTRIBUTES: [&str; 2] = ["ms-Mcs-AdmPwdExpirationTime", "msLAPS-PasswordExpirationTime"];

pub fn convert(entities: &[RawEntity]) -> Collection<ComputerNode> {
    info!(records = entities.len(), "converting computers");
    let mut out = Collection::new(CollectionKind::Computers);

    for (index, entity) in entities.iter().enumerate() {
        match normalize_computer(entity) {
            Some(node) => {
                let object_id = node.object_identifier.clone();
                if !out.push_unique(&object_id, node) {
                    warn!(index, object_id = %object_id, "skipping duplicate computer");
                }
            }
            None => {
                warn!(index, dn = ?entity.distinguished_name(), "skipping computer without objectSid");
                out.skipped += 1;
            }
        }
    }

    info!(count = out.count(), skipped = out.skipped, "computers converted");
    out
}

/// Seeded `LocalAdmins` for a computer SID.
pub fn local_admins(object_sid: &str) -> Vec<Member> {
    let Some(prefix) = sid::domain_prefix(object_sid) else {
        return Vec::new();
    };
    LOCAL_ADMIN_SEED
        .iter()
        .map(|(rid, kind)| Member::new(format!("{}-{}", prefix, rid), *kind))
        .collect()
}

/// Build a computer node, or `None` when the record has no usable SID.
pub fn normalize_computer(entity: &RawEntity) -> Option<ComputerNode> {
    let object_id = entity.object_sid()?;
    let dn = entity.distinguished_name();
    let names = normalize::derive_name(entity.first_str("userPrincipalName"), dn, NameStyle::Host);

    let primary_group_id = entity.first_int("primaryGroupID");
    let uac = AccountControl::from_attribute(entity.first_int("userAccountControl"));

    debug!(object_id = %object_id, name = ?names.name, "normalized computer");

    let properties = ComputerProperties {
        name: names.name,
        objectid: object_id.clone(),
        domain: names.domain,
        highvalue: primary_group_id.is_some_and(normalize::is_high_value_rid),
        distinguishedname: normalize::sanitize_opt(dn),
        unconstraineddelegation: uac.contains(AccountControlFlag::TrustedForDelegation),
        enabled: uac.is_enabled(),
        haslaps: LAPS_ATTRIBUTES.iter().any(|a| entity.has(a)),
        lastlogontimestamp: normalize::to_epoch(entity.first_str("lastLogonTimestamp")),
        pwdlastset: normalize::to_epoch(entity.first_str("pwdLastSet")),
        serviceprincipalnames: entity.strings("servicePrincipalName"),
        description: normalize::sanitize_opt(entity.first_str("description")),
        operatingsystem: entity.first_str("operatingSystem").map(str::to_string),
    };

    Some(ComputerNode {
        allowed_to_act: Vec::new(),
        primary_group_sid: normalize::primary_group_sid(&object_id, primary_group_id),
        local_admins: local_admins(&object_id),
        ps_remote_users: Vec::new(),
        object_identifier: object_id,
        properties,
        remote_desktop_users: Vec::new(),
        dcom_users: Vec::new(),
        allowed_to_delegate: Vec::new(),
        sessions: Vec::new(),
        aces: Vec::new(),
    })
}
