//! Identifier newtypes for people, accounts and branches.
//!
//! The backend emits ids either as JSON integers or as strings depending on
//! the endpoint, so every id accepts both on read. Ids that look like
//! canonical integers are written back as integers.

use std::cmp::Ordering;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Parse an id as a canonical unsigned integer ("42", not "042" or "+42").
fn canonical_number(raw: &str) -> Option<u64> {
    let n = raw.parse::<u64>().ok()?;
    (n.to_string() == raw).then_some(n)
}

/// Numeric ids sort numerically and before textual ids; textual ids sort
/// lexically. Keeps wire output stable for mixed id vocabularies.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (canonical_number(a), canonical_number(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

struct IdVisitor;

impl<'de> Visitor<'de> for IdVisitor {
    type Value = String;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a string or integer id")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
        Ok(v.to_owned())
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
        Ok(v.to_string())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
        Ok(v.to_string())
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $TypeName: ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
        #[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
        pub struct $TypeName(String);

        impl $TypeName {
            pub fn new(value: impl Into<String>) -> Self {
                $TypeName(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Ord for $TypeName {
            fn cmp(&self, other: &Self) -> Ordering {
                compare_ids(&self.0, &other.0)
            }
        }

        impl PartialOrd for $TypeName {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl PartialEq<str> for $TypeName {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl fmt::Display for $TypeName {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<String> for $TypeName {
            fn from(id: String) -> Self {
                $TypeName(id)
            }
        }

        impl From<&str> for $TypeName {
            fn from(id: &str) -> Self {
                $TypeName(id.to_owned())
            }
        }

        impl From<u64> for $TypeName {
            fn from(id: u64) -> Self {
                $TypeName(id.to_string())
            }
        }

        impl AsRef<str> for $TypeName {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Serialize for $TypeName {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match canonical_number(&self.0) {
                    Some(n) => serializer.serialize_u64(n),
                    None => serializer.serialize_str(&self.0),
                }
            }
        }

        impl<'de> Deserialize<'de> for $TypeName {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                deserializer.deserialize_any(IdVisitor).map($TypeName)
            }
        }
    };
}

string_id!(
    /// A directory entry id: a user, coach, parent or player record.
    PersonId
);

string_id!(
    /// A deliverable account: something with a phone for SMS or a login
    /// for in-app notifications.
    AccountId
);

string_id!(
    /// An academy branch.
    BranchId
);

impl From<PersonId> for AccountId {
    fn from(id: PersonId) -> Self {
        AccountId(id.0)
    }
}

impl From<&PersonId> for AccountId {
    fn from(id: &PersonId) -> Self {
        AccountId(id.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_accept_numbers_and_strings() {
        let ids: Vec<PersonId> = serde_json::from_str(r#"[12, "parentA", -3]"#).unwrap();
        assert_eq!(ids[0], PersonId::from("12"));
        assert_eq!(ids[1], PersonId::from("parentA"));
        assert_eq!(ids[2], PersonId::from("-3"));
    }

    #[test]
    fn test_numeric_ids_serialize_as_numbers() {
        let json = serde_json::to_string(&vec![
            AccountId::from(7u64),
            AccountId::from("007"),
            AccountId::from("parentA"),
        ])
        .unwrap();
        assert_eq!(json, r#"[7,"007","parentA"]"#);
    }

    #[test]
    fn test_numeric_ordering() {
        let mut ids = vec![
            AccountId::from("10"),
            AccountId::from("parentB"),
            AccountId::from("9"),
            AccountId::from("parentA"),
        ];
        ids.sort();
        let sorted: Vec<&str> = ids.iter().map(|i| i.as_str()).collect();
        assert_eq!(sorted, vec!["9", "10", "parentA", "parentB"]);
    }

    #[test]
    fn test_person_id_becomes_account_id() {
        let person = PersonId::from("44");
        let account: AccountId = (&person).into();
        assert_eq!(account.as_str(), "44");
    }
}
