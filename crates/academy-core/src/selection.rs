//! Audience selection: the in-progress "who receives this" choice.
//!
//! `AudienceSelection` is a sum type with one variant per mode, so a
//! role set can never leak into a user-mode resolution. The form mutates it
//! through toggles; nothing here looks at the directory.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{BranchId, PersonId, RoleTag};
use crate::wire::TargetAudience;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SelectionMode {
    All,
    ByRole,
    ByBranchRole,
    ByUser,
}

impl SelectionMode {
    pub const ALL_MODES: [SelectionMode; 4] = [
        SelectionMode::All,
        SelectionMode::ByRole,
        SelectionMode::ByBranchRole,
        SelectionMode::ByUser,
    ];
}

/// Roles and individual people picked inside one branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchSelection {
    pub roles: BTreeSet<RoleTag>,
    pub users: BTreeSet<PersonId>,
}

impl BranchSelection {
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.users.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TargetAudience", into = "TargetAudience")]
pub enum AudienceSelection {
    #[default]
    All,
    ByRole(BTreeSet<RoleTag>),
    /// Entries are never empty; toggles prune a branch once its last role
    /// and user are removed.
    ByBranchRole(BTreeMap<BranchId, BranchSelection>),
    ByUser(BTreeSet<PersonId>),
}

fn flip<T: Ord>(set: &mut BTreeSet<T>, item: T) {
    if !set.remove(&item) {
        set.insert(item);
    }
}

impl AudienceSelection {
    /// Fresh, empty selection for a mode.
    pub fn empty(mode: SelectionMode) -> Self {
        match mode {
            SelectionMode::All => AudienceSelection::All,
            SelectionMode::ByRole => AudienceSelection::ByRole(BTreeSet::new()),
            SelectionMode::ByBranchRole => AudienceSelection::ByBranchRole(BTreeMap::new()),
            SelectionMode::ByUser => AudienceSelection::ByUser(BTreeSet::new()),
        }
    }

    pub fn roles(roles: impl IntoIterator<Item = RoleTag>) -> Self {
        AudienceSelection::ByRole(roles.into_iter().collect())
    }

    pub fn users<I, P>(users: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PersonId>,
    {
        AudienceSelection::ByUser(users.into_iter().map(Into::into).collect())
    }

    pub fn mode(&self) -> SelectionMode {
        match self {
            AudienceSelection::All => SelectionMode::All,
            AudienceSelection::ByRole(_) => SelectionMode::ByRole,
            AudienceSelection::ByBranchRole(_) => SelectionMode::ByBranchRole,
            AudienceSelection::ByUser(_) => SelectionMode::ByUser,
        }
    }

    /// Switch mode. Any switch to a different mode discards everything the
    /// previous mode held; re-entering a mode later starts from empty.
    pub fn set_mode(&mut self, mode: SelectionMode) {
        if self.mode() != mode {
            debug!(from = ?self.mode(), to = ?mode, "Audience mode switched");
            *self = Self::empty(mode);
        }
    }

    pub fn toggle_role(&mut self, role: RoleTag) {
        match self {
            AudienceSelection::ByRole(roles) => flip(roles, role),
            other => debug!(mode = ?other.mode(), role = %role, "Ignoring role toggle outside by-role mode"),
        }
    }

    pub fn toggle_branch_role(&mut self, branch: BranchId, role: RoleTag) {
        match self {
            AudienceSelection::ByBranchRole(branches) => {
                let entry = branches.entry(branch.clone()).or_default();
                flip(&mut entry.roles, role);
                if entry.is_empty() {
                    branches.remove(&branch);
                }
            }
            other => debug!(mode = ?other.mode(), branch = %branch, role = %role, "Ignoring branch role toggle outside by-branch mode"),
        }
    }

    /// Flip one person. `Some(branch)` addresses the by-branch tree, `None`
    /// the flat by-user list.
    pub fn toggle_user(&mut self, branch: Option<&BranchId>, person: PersonId) {
        match (self, branch) {
            (AudienceSelection::ByUser(users), None) => flip(users, person),
            (AudienceSelection::ByBranchRole(branches), Some(branch)) => {
                let entry = branches.entry(branch.clone()).or_default();
                flip(&mut entry.users, person);
                if entry.is_empty() {
                    branches.remove(branch);
                }
            }
            (other, branch) => debug!(
                mode = ?other.mode(),
                branch = ?branch.map(|b| b.as_str()),
                person = %person,
                "Ignoring user toggle that does not address the current mode"
            ),
        }
    }

    /// Branch checkbox in the tree: selects every role in `roles` for the
    /// branch, or clears those roles when all of them are already selected.
    /// Individually picked users are left alone.
    pub fn toggle_branch(&mut self, branch: &BranchId, roles: &[RoleTag]) {
        if self.mode() != SelectionMode::ByBranchRole {
            debug!(mode = ?self.mode(), branch = %branch, "Ignoring branch toggle outside by-branch mode");
            return;
        }
        let AudienceSelection::ByBranchRole(branches) = self else {
            return;
        };
        let entry = branches.entry(branch.clone()).or_default();
        let all_selected = !roles.is_empty() && roles.iter().all(|r| entry.roles.contains(r));
        if all_selected {
            for role in roles {
                entry.roles.remove(role);
            }
        } else {
            entry.roles.extend(roles.iter().cloned());
        }
        if entry.is_empty() {
            branches.remove(branch);
        }
    }

    /// "Select all visible": adds every id, whatever its current state.
    pub fn select_users(&mut self, branch: Option<&BranchId>, ids: impl IntoIterator<Item = PersonId>) {
        match (self, branch) {
            (AudienceSelection::ByUser(users), None) => users.extend(ids),
            (AudienceSelection::ByBranchRole(branches), Some(branch)) => {
                let entry = branches.entry(branch.clone()).or_default();
                entry.users.extend(ids);
                if entry.is_empty() {
                    branches.remove(branch);
                }
            }
            (other, _) => debug!(mode = ?other.mode(), "Ignoring bulk select that does not address the current mode"),
        }
    }

    pub fn deselect_users(&mut self, branch: Option<&BranchId>, ids: impl IntoIterator<Item = PersonId>) {
        match (self, branch) {
            (AudienceSelection::ByUser(users), None) => {
                for id in ids {
                    users.remove(&id);
                }
            }
            (AudienceSelection::ByBranchRole(branches), Some(branch)) => {
                if let Some(entry) = branches.get_mut(branch) {
                    for id in ids {
                        entry.users.remove(&id);
                    }
                    if entry.is_empty() {
                        branches.remove(branch);
                    }
                }
            }
            (other, _) => debug!(mode = ?other.mode(), "Ignoring bulk deselect that does not address the current mode"),
        }
    }

    pub fn has_role(&self, role: &RoleTag) -> bool {
        matches!(self, AudienceSelection::ByRole(roles) if roles.contains(role))
    }

    pub fn has_branch_role(&self, branch: &BranchId, role: &RoleTag) -> bool {
        self.branch(branch).map(|b| b.roles.contains(role)).unwrap_or(false)
    }

    pub fn has_user(&self, branch: Option<&BranchId>, person: &PersonId) -> bool {
        match (self, branch) {
            (AudienceSelection::ByUser(users), None) => users.contains(person),
            (AudienceSelection::ByBranchRole(_), Some(branch)) => self
                .branch(branch)
                .map(|b| b.users.contains(person))
                .unwrap_or(false),
            _ => false,
        }
    }

    pub fn branch(&self, branch: &BranchId) -> Option<&BranchSelection> {
        match self {
            AudienceSelection::ByBranchRole(branches) => branches.get(branch),
            _ => None,
        }
    }

    /// True when the mode's underlying set is empty. `All` is never blank.
    /// Forms use this to block submission; resolution does not care.
    pub fn is_blank(&self) -> bool {
        match self {
            AudienceSelection::All => false,
            AudienceSelection::ByRole(roles) => roles.is_empty(),
            AudienceSelection::ByBranchRole(branches) => branches.values().all(BranchSelection::is_empty),
            AudienceSelection::ByUser(users) => users.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branch(id: &str) -> BranchId {
        BranchId::from(id)
    }

    fn populated(mode: SelectionMode) -> AudienceSelection {
        let mut s = AudienceSelection::empty(mode);
        s.toggle_role(RoleTag::Coach);
        s.toggle_role(RoleTag::Parent);
        s.toggle_branch_role(branch("b1"), RoleTag::Parent);
        s.toggle_user(Some(&branch("b2")), PersonId::from("p9"));
        s.toggle_user(None, PersonId::from("p1"));
        s
    }

    #[test]
    fn test_toggle_twice_is_noop() {
        for mode in SelectionMode::ALL_MODES {
            let original = populated(mode);

            let mut s = original.clone();
            s.toggle_role(RoleTag::Coach);
            s.toggle_role(RoleTag::Coach);
            assert_eq!(s, original);

            let mut s = original.clone();
            s.toggle_role(RoleTag::Accountant);
            s.toggle_role(RoleTag::Accountant);
            assert_eq!(s, original);

            let mut s = original.clone();
            s.toggle_branch_role(branch("b1"), RoleTag::Parent);
            s.toggle_branch_role(branch("b1"), RoleTag::Parent);
            assert_eq!(s, original);

            let mut s = original.clone();
            s.toggle_branch_role(branch("b3"), RoleTag::Coach);
            s.toggle_branch_role(branch("b3"), RoleTag::Coach);
            assert_eq!(s, original);

            let mut s = original.clone();
            s.toggle_user(Some(&branch("b2")), PersonId::from("p9"));
            s.toggle_user(Some(&branch("b2")), PersonId::from("p9"));
            assert_eq!(s, original);

            let mut s = original.clone();
            s.toggle_user(None, PersonId::from("p7"));
            s.toggle_user(None, PersonId::from("p7"));
            assert_eq!(s, original);
        }
    }

    #[test]
    fn test_toggle_flips_membership() {
        let mut s = AudienceSelection::empty(SelectionMode::ByRole);
        s.toggle_role(RoleTag::Coach);
        assert!(s.has_role(&RoleTag::Coach));
        s.toggle_role(RoleTag::Coach);
        assert!(!s.has_role(&RoleTag::Coach));
    }

    #[test]
    fn test_mode_switch_clears_other_fields() {
        for from in SelectionMode::ALL_MODES {
            for to in SelectionMode::ALL_MODES {
                if from == to {
                    continue;
                }
                let mut s = populated(from);
                s.set_mode(to);
                assert_eq!(s, AudienceSelection::empty(to), "{:?} -> {:?}", from, to);
            }
        }
    }

    #[test]
    fn test_set_same_mode_keeps_selection() {
        let mut s = populated(SelectionMode::ByRole);
        s.set_mode(SelectionMode::ByRole);
        assert!(s.has_role(&RoleTag::Coach));
    }

    #[test]
    fn test_reentering_mode_does_not_restore_roles() {
        let mut s = AudienceSelection::roles([RoleTag::Coach, RoleTag::Parent]);
        s.set_mode(SelectionMode::All);
        s.set_mode(SelectionMode::ByRole);
        assert_eq!(s, AudienceSelection::ByRole(BTreeSet::new()));
    }

    #[test]
    fn test_toggles_outside_mode_are_ignored() {
        let mut s = AudienceSelection::All;
        s.toggle_role(RoleTag::Coach);
        s.toggle_user(None, PersonId::from("p1"));
        s.toggle_branch_role(branch("b1"), RoleTag::Coach);
        assert_eq!(s, AudienceSelection::All);

        let mut s = AudienceSelection::empty(SelectionMode::ByUser);
        s.toggle_user(Some(&branch("b1")), PersonId::from("p1"));
        assert!(s.is_blank());
    }

    #[test]
    fn test_unknown_role_is_stored() {
        let mut s = AudienceSelection::empty(SelectionMode::ByRole);
        s.toggle_role(RoleTag::from("physio"));
        assert!(s.has_role(&RoleTag::Other("physio".to_string())));
    }

    #[test]
    fn test_branch_entries_are_pruned() {
        let mut s = AudienceSelection::empty(SelectionMode::ByBranchRole);
        s.toggle_branch_role(branch("b1"), RoleTag::Coach);
        s.toggle_user(Some(&branch("b1")), PersonId::from("p1"));
        s.toggle_branch_role(branch("b1"), RoleTag::Coach);
        assert!(s.branch(&branch("b1")).is_some());
        s.toggle_user(Some(&branch("b1")), PersonId::from("p1"));
        assert!(s.branch(&branch("b1")).is_none());
        assert!(s.is_blank());
    }

    #[test]
    fn test_toggle_branch_selects_then_clears() {
        let roles = RoleTag::BRANCH_SCOPE;
        let mut s = AudienceSelection::empty(SelectionMode::ByBranchRole);
        s.toggle_branch_role(branch("b1"), RoleTag::Coach);

        s.toggle_branch(&branch("b1"), &roles);
        for role in &roles {
            assert!(s.has_branch_role(&branch("b1"), role));
        }

        s.toggle_branch(&branch("b1"), &roles);
        assert!(s.branch(&branch("b1")).is_none());
    }

    #[test]
    fn test_toggle_branch_keeps_individual_users() {
        let roles = RoleTag::BRANCH_SCOPE;
        let mut s = AudienceSelection::empty(SelectionMode::ByBranchRole);
        s.toggle_user(Some(&branch("b1")), PersonId::from("p1"));
        s.toggle_branch(&branch("b1"), &roles);
        s.toggle_branch(&branch("b1"), &roles);
        assert!(s.has_user(Some(&branch("b1")), &PersonId::from("p1")));
    }

    #[test]
    fn test_bulk_select_and_deselect() {
        let ids = vec![PersonId::from("p1"), PersonId::from("p2")];
        let mut s = AudienceSelection::users(["p2"]);
        s.select_users(None, ids.clone());
        assert_eq!(s, AudienceSelection::users(["p1", "p2"]));
        s.select_users(None, ids.clone());
        assert_eq!(s, AudienceSelection::users(["p1", "p2"]));
        s.deselect_users(None, ids);
        assert!(s.is_blank());
    }

    #[test]
    fn test_all_is_never_blank() {
        assert!(!AudienceSelection::All.is_blank());
        assert!(AudienceSelection::empty(SelectionMode::ByRole).is_blank());
        assert!(AudienceSelection::empty(SelectionMode::ByBranchRole).is_blank());
    }
}
