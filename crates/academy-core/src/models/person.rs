use serde::{Deserialize, Serialize};

use super::{AccountId, BranchId, Locale, PersonId, RoleTag};
use crate::utils::contains_ignore_case;

/// Bilingual display name as served by the directory endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayName {
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub ar: String,
}

impl DisplayName {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }

    /// Name in the requested language, falling back to the other one when
    /// the record only has a single translation.
    pub fn get(&self, locale: Locale) -> &str {
        let (preferred, fallback) = match locale {
            Locale::En => (&self.en, &self.ar),
            Locale::Ar => (&self.ar, &self.en),
        };
        if preferred.trim().is_empty() {
            fallback
        } else {
            preferred
        }
    }

    pub fn matches(&self, needle: &str) -> bool {
        contains_ignore_case(&self.en, needle) || contains_ignore_case(&self.ar, needle)
    }
}

/// One entry of the directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRecord {
    pub id: PersonId,
    pub role: RoleTag,
    #[serde(rename = "displayName")]
    pub display_name: DisplayName,
    /// None for staff attached to the academy rather than a branch.
    #[serde(rename = "branchId")]
    pub branch_id: Option<BranchId>,
    /// Players only: the player's own login, if they registered one.
    #[serde(rename = "accountId", default)]
    pub account_id: Option<PersonId>,
    /// Players only: the parent account.
    #[serde(rename = "relatedAccountId", default)]
    pub related_account_id: Option<PersonId>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl PersonRecord {
    pub fn new(id: impl Into<PersonId>, role: RoleTag, display_name: DisplayName) -> Self {
        Self {
            id: id.into(),
            role,
            display_name,
            branch_id: None,
            account_id: None,
            related_account_id: None,
            email: None,
            phone: None,
        }
    }

    pub fn in_branch(mut self, branch: impl Into<BranchId>) -> Self {
        self.branch_id = Some(branch.into());
        self
    }

    pub fn with_account(mut self, account: impl Into<PersonId>) -> Self {
        self.account_id = Some(account.into());
        self
    }

    pub fn with_related_account(mut self, account: impl Into<PersonId>) -> Self {
        self.related_account_id = Some(account.into());
        self
    }

    pub fn belongs_to(&self, branch: &BranchId) -> bool {
        self.branch_id.as_ref() == Some(branch)
    }

    /// Deliverable accounts this person stands for.
    ///
    /// Players are never addressed directly: they contribute the parent
    /// account and their own login, whichever exist (possibly neither).
    /// Everyone else is their own account.
    pub fn accounts(&self) -> Vec<AccountId> {
        if self.role.is_player() {
            self.related_account_id
                .iter()
                .chain(self.account_id.iter())
                .map(AccountId::from)
                .collect()
        } else {
            vec![AccountId::from(&self.id)]
        }
    }

    /// Search predicate for presentation filtering: either name or the email.
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim();
        needle.is_empty()
            || self.display_name.matches(needle)
            || self
                .email
                .as_deref()
                .map(|e| contains_ignore_case(e, needle))
                .unwrap_or(false)
    }
}
