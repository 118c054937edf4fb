//! Audience targeting for academy announcements and SMS.
//!
//! An `AudienceSelection` is built in the authoring form, stored as the
//! `target_audience` field, and resolved against a `Directory` snapshot to
//! the accounts that receive the message. The authoring preview and the
//! dispatcher both go through [`resolve`], so they cannot disagree.

pub mod api;
pub mod cache;
pub mod config;
pub mod directory;
pub mod models;
pub mod resolver;
pub mod selection;
pub mod summary;
pub mod utils;
pub mod wire;

#[cfg(test)]
mod fixtures;

pub use config::Config;
pub use directory::{Directory, DirectoryView, Scope};
pub use models::{AccountId, BranchId, Locale, PersonId, PersonRecord, RoleTag};
pub use resolver::{resolve, resolve_with_report, ResolutionReport, ResolvedAudience};
pub use selection::{AudienceSelection, BranchSelection, SelectionMode};
pub use summary::{branch_state, role_state, summarize, AudienceSummary, TriState};
pub use wire::{decode_target_audience, encode_target_audience, WireError};
