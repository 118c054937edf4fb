//! Audience resolution.
//!
//! `resolve` turns an `AudienceSelection` and a `Directory` into the set of
//! deliverable accounts. It is pure: no I/O, no hidden state, and the same
//! inputs always give the same set. The authoring UI uses it for live
//! previews and the dispatcher links the very same function for delivery.
//!
//! Players are never targets themselves. A player stands for its parent
//! account and its own login, whichever exist; a player with neither
//! reaches nobody. Selected ids missing from the directory are dropped and
//! reported, never raised.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::directory::Directory;
use crate::models::{AccountId, BranchId, PersonId, PersonRecord};
use crate::selection::AudienceSelection;

/// Deduplicated, sorted set of account ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedAudience(BTreeSet<AccountId>);

impl ResolvedAudience {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, account: &AccountId) -> bool {
        self.0.contains(account)
    }

    /// Accounts in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &AccountId> {
        self.0.iter()
    }

    pub fn is_subset(&self, other: &ResolvedAudience) -> bool {
        self.0.is_subset(&other.0)
    }

    pub fn to_vec(&self) -> Vec<AccountId> {
        self.0.iter().cloned().collect()
    }
}

impl FromIterator<AccountId> for ResolvedAudience {
    fn from_iter<I: IntoIterator<Item = AccountId>>(iter: I) -> Self {
        ResolvedAudience(iter.into_iter().collect())
    }
}

impl IntoIterator for ResolvedAudience {
    type Item = AccountId;
    type IntoIter = std::collections::btree_set::IntoIter<AccountId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// The id is not in the snapshot, e.g. the person was deleted.
    NotInDirectory,
    /// Picked under a branch the person is not listed in.
    OutsideBranch,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DroppedId {
    pub id: PersonId,
    pub branch: Option<BranchId>,
    pub reason: DropReason,
}

/// What resolution had to skip. Purely informational.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionReport {
    pub dropped: Vec<DroppedId>,
    /// Players that were selected but have neither a parent nor an own
    /// account to deliver to.
    pub unreachable_players: BTreeSet<PersonId>,
}

impl ResolutionReport {
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty() && self.unreachable_players.is_empty()
    }

    fn drop_id(&mut self, id: &PersonId, branch: Option<&BranchId>, reason: DropReason) {
        debug!(id = %id, branch = ?branch.map(|b| b.as_str()), reason = ?reason, "Dropping selected id");
        self.dropped.push(DroppedId {
            id: id.clone(),
            branch: branch.cloned(),
            reason,
        });
    }
}

/// Directory records a selection sweeps in, in traversal order. The same
/// person may appear more than once when reached through several paths.
pub(crate) fn sweep<'a>(
    selection: &AudienceSelection,
    directory: &'a Directory,
    report: &mut ResolutionReport,
) -> Vec<&'a PersonRecord> {
    match selection {
        AudienceSelection::All => directory.people().iter().collect(),
        AudienceSelection::ByRole(roles) => directory
            .people()
            .iter()
            .filter(|p| roles.contains(&p.role))
            .collect(),
        AudienceSelection::ByBranchRole(branches) => {
            let mut swept = Vec::new();
            for (branch, picked) in branches {
                swept.extend(
                    directory
                        .people_in_branch(branch)
                        .filter(|p| picked.roles.contains(&p.role)),
                );
                for id in &picked.users {
                    let mut known = false;
                    let mut found = false;
                    for record in directory.lookup(id) {
                        known = true;
                        if record.belongs_to(branch) {
                            found = true;
                            swept.push(record);
                        }
                    }
                    if !known {
                        report.drop_id(id, Some(branch), DropReason::NotInDirectory);
                    } else if !found {
                        report.drop_id(id, Some(branch), DropReason::OutsideBranch);
                    }
                }
            }
            swept
        }
        AudienceSelection::ByUser(users) => {
            let mut swept = Vec::new();
            for id in users {
                let before = swept.len();
                swept.extend(directory.lookup(id));
                if swept.len() == before {
                    report.drop_id(id, None, DropReason::NotInDirectory);
                }
            }
            swept
        }
    }
}

/// Accounts for swept records, applying the player rule.
pub(crate) fn collect_accounts(swept: &[&PersonRecord], report: &mut ResolutionReport) -> ResolvedAudience {
    let mut accounts = BTreeSet::new();
    for person in swept {
        let reached = person.accounts();
        if reached.is_empty() {
            report.unreachable_players.insert(person.id.clone());
        }
        accounts.extend(reached);
    }
    ResolvedAudience(accounts)
}

/// Resolve a selection and report everything that was skipped.
pub fn resolve_with_report(selection: &AudienceSelection, directory: &Directory) -> (ResolvedAudience, ResolutionReport) {
    let mut report = ResolutionReport::default();
    let swept = sweep(selection, directory, &mut report);
    let audience = collect_accounts(&swept, &mut report);

    if !report.dropped.is_empty() {
        warn!(
            mode = ?selection.mode(),
            dropped = report.dropped.len(),
            "Selected ids missing from the directory were skipped"
        );
    }
    if !report.unreachable_players.is_empty() {
        debug!(
            players = report.unreachable_players.len(),
            "Selected players have no parent or own account"
        );
    }
    debug!(mode = ?selection.mode(), swept = swept.len(), accounts = audience.len(), "Resolved audience");

    (audience, report)
}

/// Resolve a selection against a directory snapshot.
pub fn resolve(selection: &AudienceSelection, directory: &Directory) -> ResolvedAudience {
    resolve_with_report(selection, directory).0
}
