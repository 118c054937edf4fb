use crate::models::{BranchId, Locale, PersonId, PersonRecord, RoleTag};
use crate::utils::cmp_ignore_case;

use super::{BranchInfo, Directory, DirectoryPayload};

/// A filtered presentation of a directory.
///
/// Search narrows what is shown, never what can be resolved: the view only
/// borrows the directory and knows nothing about the selection, so a person
/// picked while a filter was active stays picked once it is cleared.
#[derive(Debug, Clone)]
pub struct DirectoryView<'a> {
    directory: &'a Directory,
    query: String,
    matches: Vec<&'a PersonRecord>,
}

impl<'a> DirectoryView<'a> {
    pub fn new(directory: &'a Directory, query: &str) -> Self {
        let query = query.trim().to_string();
        let matches = directory
            .people()
            .iter()
            .filter(|p| p.matches(&query))
            .collect();
        Self {
            directory,
            query,
            matches,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn is_filtered(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn people(&self) -> &[&'a PersonRecord] {
        &self.matches
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Branches with at least one visible person. With no query every
    /// branch is shown, including empty ones.
    pub fn branches(&self) -> Vec<&'a BranchInfo> {
        self.directory
            .branches()
            .iter()
            .filter(|b| !self.is_filtered() || self.matches.iter().any(|p| p.belongs_to(&b.id)))
            .collect()
    }

    /// Visible people of one role in one branch, sorted by name for display.
    pub fn group(&self, branch: Option<&BranchId>, role: &RoleTag, locale: Locale) -> Vec<&'a PersonRecord> {
        let mut group: Vec<&'a PersonRecord> = self
            .matches
            .iter()
            .copied()
            .filter(|p| &p.role == role)
            .filter(|p| branch.map(|b| p.belongs_to(b)).unwrap_or(true))
            .collect();
        group.sort_by(|a, b| cmp_ignore_case(a.display_name.get(locale), b.display_name.get(locale)));
        group
    }

    /// Ids behind a "select all visible" checkbox.
    pub fn visible_ids(&self, branch: Option<&BranchId>, role: &RoleTag) -> Vec<PersonId> {
        self.group(branch, role, Locale::En)
            .into_iter()
            .map(|p| p.id.clone())
            .collect()
    }
}

impl Directory {
    pub fn search(&self, query: &str) -> DirectoryView<'_> {
        DirectoryView::new(self, query)
    }
}

/// Matches returned by a server-side search.
///
/// Only a list for display; it is not a `Directory` and cannot be resolved
/// against, so a filtered response can never shrink an audience.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    query: String,
    people: Vec<PersonRecord>,
}

impl SearchResults {
    pub fn from_payload(query: &str, payload: &DirectoryPayload) -> Self {
        Self {
            query: query.trim().to_string(),
            people: Directory::from_payload(payload).people().to_vec(),
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn people(&self) -> &[PersonRecord] {
        &self.people
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Ids behind "select all results", optionally limited to one role.
    pub fn ids(&self, role: Option<&RoleTag>) -> Vec<PersonId> {
        self.people
            .iter()
            .filter(|p| role.map(|r| &p.role == r).unwrap_or(true))
            .map(|p| p.id.clone())
            .collect()
    }
}
