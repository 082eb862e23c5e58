//! Users pipeline: `domain_users.json` -> `users.json`.

use tracing::{debug, info, warn};

use super::Collection;
use crate::bloodhound::{CollectionKind, UserNode, UserProperties};
use crate::directory::normalize::{self, NameStyle};
use crate::directory::{AccountControl, AccountControlFlag, RawEntity};
use crate::refs::ReferenceTable;

/// Normalize every user and record each one in `refs`.
pub fn convert(entities: &[RawEntity], refs: &mut ReferenceTable) -> Collection<UserNode> {
    info!(records = entities.len(), "converting users");
    let mut out = Collection::new(CollectionKind::Users);

    for (index, entity) in entities.iter().enumerate() {
        match normalize_user(entity) {
            Some(node) => {
                let object_id = node.object_identifier.clone();
                if out.push_unique(&object_id, node) {
                    refs.record_account(entity);
                } else {
                    warn!(index, object_id = %object_id, "skipping duplicate user");
                }
            }
            None => {
                warn!(index, dn = ?entity.distinguished_name(), "skipping user without objectSid");
                out.skipped += 1;
            }
        }
    }

    info!(count = out.count(), skipped = out.skipped, "users converted");
    out
}

/// Build a user node, or `None` when the record has no usable SID.
pub fn normalize_user(entity: &RawEntity) -> Option<UserNode> {
    let object_id = entity.object_sid()?;
    let dn = entity.distinguished_name();
    let names = normalize::derive_name(
        entity.first_str("userPrincipalName"),
        dn,
        NameStyle::Principal,
    );

    let primary_group_id = entity.first_int("primaryGroupID");
    let uac = AccountControl::from_attribute(entity.first_int("userAccountControl"));
    let spns = entity.strings("servicePrincipalName");

    let display_name = entity
        .first_str("displayName")
        .or_else(|| entity.first_str("sAMAccountName"));

    debug!(object_id = %object_id, name = ?names.name, "normalized user");

    let properties = UserProperties {
        name: names.name,
        domain: names.domain,
        objectid: object_id.clone(),
        distinguishedname: normalize::sanitize_opt(dn),
        highvalue: primary_group_id.is_some_and(normalize::is_high_value_rid),
        unconstraineddelegation: uac.contains(AccountControlFlag::TrustedForDelegation),
        passwordnotreqd: uac.contains(AccountControlFlag::PasswdNotReqd),
        enabled: uac.is_enabled(),
        lastlogon: normalize::to_epoch(entity.first_str("lastLogon")),
        lastlogontimestamp: normalize::to_epoch(entity.first_str("lastLogonTimestamp")),
        pwdlastset: normalize::to_epoch(entity.first_str("pwdLastSet")),
        dontreqpreauth: uac.contains(AccountControlFlag::DontReqPreauth),
        pwdneverexpires: uac.contains(AccountControlFlag::DontExpirePassword),
        sensitive: uac.contains(AccountControlFlag::NotDelegated),
        hasspn: !spns.is_empty(),
        serviceprincipalnames: spns,
        displayname: normalize::sanitize_opt(display_name),
        email: None,
        title: None,
        homedirectory: None,
        description: normalize::sanitize_opt(entity.first_str("description")),
        userpassword: None,
        admincount: entity.first_int("adminCount").is_some_and(|v| v != 0),
        sidhistory: Vec::new(),
    };

    Some(UserNode {
        allowed_to_delegate: Vec::new(),
        primary_group_sid: normalize::primary_group_sid(&object_id, primary_group_id),
        object_identifier: object_id,
        properties,
        aces: Vec::new(),
        spn_targets: Vec::new(),
        has_sid_history: Vec::new(),
    })
}
