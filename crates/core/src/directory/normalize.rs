//! Attribute normalization rules shared by every entity pipeline.

use chrono::{NaiveDateTime, TimeZone, Utc};

use crate::sid;

/// Timestamp sentinel for "unknown or absent".
pub const UNKNOWN_TIMESTAMP: i64 = -1;

/// Format of absolute timestamps in the dump, always UTC. The fraction is
/// mandatory, so whole-second values such as the `1601-01-01 00:00:00+00:00`
/// "never" marker are unknown.
const DUMP_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%f+00:00";

/// Well-known privileged RIDs: Domain Admins, Domain Controllers, Enterprise
/// Admins and Group Policy Creator Owners.
pub const HIGH_VALUE_RIDS: [i64; 4] = [512, 516, 519, 520];

/// Convert `YYYY-MM-DD HH:MM:SS.ffffff+00:00` into Unix epoch seconds.
/// Anything absent or unparseable yields [`UNKNOWN_TIMESTAMP`].
pub fn to_epoch(value: Option<&str>) -> i64 {
    let Some(text) = value else {
        return UNKNOWN_TIMESTAMP;
    };
    match NaiveDateTime::parse_from_str(text.trim(), DUMP_TIMESTAMP_FORMAT) {
        Ok(naive) => Utc.from_utc_datetime(&naive).timestamp(),
        Err(_) => UNKNOWN_TIMESTAMP,
    }
}

/// Replace both quote characters with a backtick.
pub fn sanitize(text: &str) -> String {
    text.replace(['"', '\''], "`")
}

pub fn sanitize_opt(text: Option<&str>) -> Option<String> {
    text.map(sanitize)
}

/// `true` iff `id` is one of [`HIGH_VALUE_RIDS`].
pub fn is_high_value_rid(id: i64) -> bool {
    HIGH_VALUE_RIDS.contains(&id)
}

/// High-value test on the trailing RID of a textual SID.
pub fn is_high_value_sid(object_sid: &str) -> bool {
    sid::relative_id(object_sid).is_some_and(|rid| is_high_value_rid(i64::from(rid)))
}

/// Primary group SID: the object's domain prefix joined with its
/// `primaryGroupID`.
pub fn primary_group_sid(object_sid: &str, primary_group_id: Option<i64>) -> Option<String> {
    let prefix = sid::domain_prefix(object_sid)?;
    primary_group_id.map(|id| format!("{}-{}", prefix, id))
}

// ---------------------------------------------------------------------------
// Distinguished names
// ---------------------------------------------------------------------------

/// Split a DN into `(attribute, value)` pairs on unescaped commas, with
/// backslash escapes removed from the values.
pub fn relative_components(dn: &str) -> Vec<(String, String)> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for ch in dn.chars() {
        if escaped {
            current.push(ch);
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == ',' {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(ch);
        }
    }
    parts.push(current);

    parts
        .into_iter()
        .filter_map(|part| {
            let (key, value) = part.split_once('=')?;
            Some((key.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Value of the leading relative component (`CN=<name>,...`).
pub fn leading_name(dn: &str) -> Option<String> {
    relative_components(dn)
        .into_iter()
        .next()
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// DNS domain from the `DC=` components, uppercased and dot-joined.
pub fn dn_domain(dn: &str) -> Option<String> {
    let labels: Vec<String> = relative_components(dn)
        .into_iter()
        .filter(|(key, _)| key.eq_ignore_ascii_case("DC"))
        .map(|(_, value)| value.to_uppercase())
        .collect();
    if labels.is_empty() {
        None
    } else {
        Some(labels.join("."))
    }
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

/// How a principal's name is joined to its domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStyle {
    /// `NAME@DOMAIN` (users, groups).
    Principal,
    /// `NAME.DOMAIN` (computers).
    Host,
}

impl NameStyle {
    fn separator(self) -> char {
        match self {
            Self::Principal => '@',
            Self::Host => '.',
        }
    }
}

/// Display name and domain suffix of a principal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipalName {
    pub name: Option<String>,
    pub domain: Option<String>,
}

/// Derive name and domain from the principal-name attribute when present,
/// otherwise from the distinguished name.
pub fn derive_name(principal: Option<&str>, dn: Option<&str>, style: NameStyle) -> PrincipalName {
    let sep = style.separator();

    if let Some(principal) = principal.filter(|p| !p.is_empty()) {
        let name = principal.to_uppercase();
        let domain = match name.split_once(sep) {
            Some((_, suffix)) if !suffix.is_empty() => Some(suffix.to_string()),
            _ => dn.and_then(dn_domain),
        };
        return PrincipalName {
            name: Some(name),
            domain,
        };
    }

    let Some(dn) = dn else {
        return PrincipalName::default();
    };
    let short = leading_name(dn).map(|n| n.to_uppercase());
    let domain = dn_domain(dn);
    let name = match (short, &domain) {
        (Some(short), Some(domain)) => Some(format!("{}{}{}", short, sep, domain)),
        (Some(short), None) => Some(short),
        (None, _) => None,
    };
    PrincipalName { name, domain }
}
