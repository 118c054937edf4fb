//! Data models for the academy directory.
//!
//! - `PersonId`, `AccountId`, `BranchId`: string-backed ids
//! - `RoleTag`: role vocabulary, open to server-defined roles
//! - `PersonRecord`, `DisplayName`: directory entries with bilingual names
//! - `OutboundMessage`, `Channel`: announcement/SMS create requests
//! - `Locale`: label language for summaries

pub mod ids;
pub mod message;
pub mod person;
pub mod role;

use serde::{Deserialize, Serialize};

pub use ids::{AccountId, BranchId, PersonId};
pub use message::{Channel, OutboundMessage};
pub use person::{DisplayName, PersonRecord};
pub use role::RoleTag;

/// Dashboard language.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

impl Locale {
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Locale::En),
            "ar" | "arabic" => Some(Locale::Ar),
            _ => None,
        }
    }
}
