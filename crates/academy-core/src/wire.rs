//! `target_audience` wire format.
//!
//! Announcements and SMS records carry their audience in one field that
//! has taken several shapes over time:
//!
//! - legacy bare strings: `"all"`, `"parents"`, `"coaches"`, `"players"`
//! - tagged objects: `{"type": "roles", "roles": [...]}`,
//!   `{"type": "users", "users": [...]}`,
//!   `{"type": "specific", "branches": {...}, "users": [...]}`
//! - either of the above JSON-encoded inside a string, as older rows were
//!   stored by the backend
//!
//! Everything is normalized into `AudienceSelection` here; business logic
//! never branches on the raw shape. Writes always produce the canonical
//! form with sorted arrays.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::models::{BranchId, PersonId, RoleTag};
use crate::selection::{AudienceSelection, BranchSelection};

#[derive(Error, Debug)]
pub enum WireError {
    #[error("target_audience is empty")]
    Empty,

    #[error("Malformed target_audience: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetAudience {
    Tagged(TaggedAudience),
    Legacy(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TaggedAudience {
    All,
    Roles {
        #[serde(default)]
        roles: Vec<RoleTag>,
    },
    Users {
        #[serde(default)]
        users: Vec<PersonId>,
    },
    Specific {
        #[serde(default)]
        branches: BTreeMap<BranchId, WireBranch>,
        #[serde(default)]
        users: Vec<PersonId>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireBranch {
    #[serde(default)]
    pub roles: Vec<RoleTag>,
    #[serde(default)]
    pub users: Vec<PersonId>,
}

fn decode_legacy(raw: &str) -> Result<AudienceSelection, WireError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(WireError::Empty);
    }
    if trimmed.starts_with('{') {
        let tagged: TaggedAudience = serde_json::from_str(trimmed)?;
        return Ok(decode_tagged(tagged));
    }
    if trimmed.eq_ignore_ascii_case("all") {
        return Ok(AudienceSelection::All);
    }
    Ok(AudienceSelection::ByRole(BTreeSet::from([RoleTag::from_legacy(trimmed)])))
}

fn decode_tagged(tagged: TaggedAudience) -> AudienceSelection {
    match tagged {
        TaggedAudience::All => AudienceSelection::All,
        TaggedAudience::Roles { roles } => AudienceSelection::ByRole(roles.into_iter().collect()),
        TaggedAudience::Users { users } => AudienceSelection::ByUser(users.into_iter().collect()),
        TaggedAudience::Specific { branches, users } => {
            let branches: BTreeMap<BranchId, BranchSelection> = branches
                .into_iter()
                .map(|(id, b)| {
                    let selection = BranchSelection {
                        roles: b.roles.into_iter().collect(),
                        users: b.users.into_iter().collect(),
                    };
                    (id, selection)
                })
                .filter(|(_, b)| !b.is_empty())
                .collect();

            if branches.is_empty() {
                // Branch-admin screens send their picks as top-level users
                return AudienceSelection::ByUser(users.into_iter().collect());
            }
            if !users.is_empty() {
                warn!(
                    ignored = users.len(),
                    "Top-level users alongside branch selections are not addressable, ignoring"
                );
            }
            AudienceSelection::ByBranchRole(branches)
        }
    }
}

impl TryFrom<TargetAudience> for AudienceSelection {
    type Error = WireError;

    fn try_from(value: TargetAudience) -> Result<Self, Self::Error> {
        match value {
            TargetAudience::Legacy(raw) => decode_legacy(&raw),
            TargetAudience::Tagged(tagged) => Ok(decode_tagged(tagged)),
        }
    }
}

impl From<AudienceSelection> for TargetAudience {
    fn from(selection: AudienceSelection) -> Self {
        match selection {
            AudienceSelection::All => TargetAudience::Legacy("all".to_string()),
            AudienceSelection::ByRole(roles) => TargetAudience::Tagged(TaggedAudience::Roles {
                roles: roles.into_iter().collect(),
            }),
            AudienceSelection::ByUser(users) => TargetAudience::Tagged(TaggedAudience::Users {
                users: users.into_iter().collect(),
            }),
            AudienceSelection::ByBranchRole(branches) => {
                TargetAudience::Tagged(TaggedAudience::Specific {
                    branches: branches
                        .into_iter()
                        .map(|(id, b)| {
                            let wire = WireBranch {
                                roles: b.roles.into_iter().collect(),
                                users: b.users.into_iter().collect(),
                            };
                            (id, wire)
                        })
                        .collect(),
                    users: Vec::new(),
                })
            }
        }
    }
}

/// Decode a `target_audience` value taken from a request or a stored row.
pub fn decode_target_audience(value: serde_json::Value) -> Result<AudienceSelection, WireError> {
    if value.is_null() {
        return Err(WireError::Empty);
    }
    let raw: TargetAudience = serde_json::from_value(value)?;
    AudienceSelection::try_from(raw)
}

/// Canonical `target_audience` value for outbound requests.
pub fn encode_target_audience(selection: &AudienceSelection) -> serde_json::Value {
    serde_json::Value::from(TargetAudience::from(selection.clone()))
}

impl From<TargetAudience> for serde_json::Value {
    fn from(audience: TargetAudience) -> Self {
        match audience {
            TargetAudience::Legacy(raw) => serde_json::Value::String(raw),
            TargetAudience::Tagged(tagged) => {
                serde_json::to_value(tagged).unwrap_or(serde_json::Value::Null)
            }
        }
    }
}
