//! Raw directory records as produced by ldapdomaindump.
//!
//! Each input collection is a JSON array of records shaped like
//! `{"attributes": {"<name>": [<value>, ...], ...}, "dn": "..."}`. Directory
//! attributes are multi-valued, so every attribute is held as a list; a bare
//! value is accepted as a one-element list and `null` as an empty one.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// The value list of a single attribute.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct AttributeValues(Vec<Value>);

impl From<Value> for AttributeValues {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self(Vec::new()),
            Value::Array(items) => Self(items.into_iter().filter(|v| !v.is_null()).collect()),
            other => Self(vec![other]),
        }
    }
}

impl AttributeValues {
    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }
}

/// One directory object: an attribute bag keyed by attribute name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntity {
    #[serde(default)]
    attributes: BTreeMap<String, AttributeValues>,

    /// Distinguished name carried next to the attribute bag.
    #[serde(default)]
    dn: Option<String>,
}

impl RawEntity {
    /// Build an entity from a JSON attribute object. Mostly useful in tests.
    pub fn from_attributes(attributes: Value) -> Self {
        let attributes = match attributes {
            Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| (k, AttributeValues::from(v)))
                .collect(),
            _ => BTreeMap::new(),
        };
        Self {
            attributes,
            dn: None,
        }
    }

    /// All values of an attribute. Lookup is exact first, then ASCII
    /// case-insensitive.
    pub fn values(&self, name: &str) -> &[Value] {
        if let Some(values) = self.attributes.get(name) {
            return values.as_slice();
        }
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the attribute is present with at least one value.
    pub fn has(&self, name: &str) -> bool {
        !self.values(name).is_empty()
    }

    pub fn first(&self, name: &str) -> Option<&Value> {
        self.values(name).first()
    }

    /// First value as text. Non-string scalars are not coerced.
    pub fn first_str(&self, name: &str) -> Option<&str> {
        self.first(name).and_then(Value::as_str)
    }

    /// First value as an integer, accepting JSON numbers and numeric strings.
    pub fn first_int(&self, name: &str) -> Option<i64> {
        match self.first(name)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Every value rendered as text, in input order. Objects and arrays are
    /// skipped.
    pub fn strings(&self, name: &str) -> Vec<String> {
        self.values(name)
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect()
    }

    /// The object's distinguished name: the `distinguishedName` attribute,
    /// falling back to the record-level `dn`.
    pub fn distinguished_name(&self) -> Option<&str> {
        self.first_str("distinguishedName")
            .or(self.dn.as_deref())
            .filter(|dn| !dn.is_empty())
    }

    /// The object's SID in text form (see [`crate::sid::from_value`]).
    pub fn object_sid(&self) -> Option<String> {
        self.first("objectSid").and_then(crate::sid::from_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_dump_record() {
        let raw = r#"{
            "attributes": {
                "objectSid": ["S-1-5-21-1-2-3-1104"],
                "primaryGroupID": [513],
                "servicePrincipalName": ["HTTP/web01", "HTTP/web01.example.com"],
                "description": null
            },
            "dn": "CN=Bob,OU=Users,DC=EXAMPLE,DC=COM"
        }"#;
        let entity: RawEntity = serde_json::from_str(raw).unwrap();
        assert_eq!(entity.object_sid().as_deref(), Some("S-1-5-21-1-2-3-1104"));
        assert_eq!(entity.first_int("primaryGroupID"), Some(513));
        assert_eq!(entity.strings("servicePrincipalName").len(), 2);
        assert!(!entity.has("description"));
        assert_eq!(
            entity.distinguished_name(),
            Some("CN=Bob,OU=Users,DC=EXAMPLE,DC=COM")
        );
    }

    #[test]
    fn test_bare_value_is_single_element_list() {
        let entity = RawEntity::from_attributes(json!({ "cn": "example.com" }));
        assert_eq!(entity.values("cn").len(), 1);
        assert_eq!(entity.first_str("cn"), Some("example.com"));
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let entity = RawEntity::from_attributes(json!({ "msDS-Behavior-Version": [7] }));
        assert_eq!(entity.first_int("msds-behavior-version"), Some(7));
        assert!(entity.has("MSDS-BEHAVIOR-VERSION"));
        assert!(!entity.has("msds-other"));
    }

    #[test]
    fn test_numeric_string_int() {
        let entity = RawEntity::from_attributes(json!({ "userAccountControl": ["66048"] }));
        assert_eq!(entity.first_int("userAccountControl"), Some(66048));
        let entity = RawEntity::from_attributes(json!({ "userAccountControl": ["nope"] }));
        assert_eq!(entity.first_int("userAccountControl"), None);
    }

    #[test]
    fn test_distinguished_name_prefers_attribute() {
        let raw = r#"{"attributes": {"distinguishedName": ["CN=A,DC=X"]}, "dn": "CN=B,DC=X"}"#;
        let entity: RawEntity = serde_json::from_str(raw).unwrap();
        assert_eq!(entity.distinguished_name(), Some("CN=A,DC=X"));

        let entity = RawEntity::default();
        assert_eq!(entity.distinguished_name(), None);
    }
}
