//! Summary projection for the authoring form.
//!
//! Counts come from the same sweep the resolver runs, so the number shown
//! next to the audience picker is always the number of accounts the
//! dispatcher will deliver to.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::directory::Directory;
use crate::models::{BranchId, Locale, PersonId, RoleTag};
use crate::resolver::{collect_accounts, sweep, ResolutionReport};
use crate::selection::AudienceSelection;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct RoleCount {
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub role: RoleTag,
    /// Distinct people of this role swept in, before the player rule.
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct AudienceSummary {
    /// Distinct deliverable accounts.
    pub count: usize,
    pub label: String,
    pub branch_count: usize,
    pub role_breakdown: Vec<RoleCount>,
}

impl AudienceSummary {
    /// Nobody would receive the message.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Checkbox state of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum TriState {
    Checked,
    Partial,
    Unchecked,
}

// ============================================================================
// Labels
// ============================================================================

fn all_label(count: usize, locale: Locale) -> String {
    match locale {
        Locale::En => format!("All users ({})", count),
        Locale::Ar => format!("جميع المستخدمين ({})", count),
    }
}

fn users_label(count: usize, locale: Locale) -> String {
    match (locale, count) {
        (Locale::En, 1) => "1 user".to_string(),
        (Locale::En, n) => format!("{} users", n),
        (Locale::Ar, n) => format!("{} مستخدم", n),
    }
}

fn branches_label(branches: usize, count: usize, locale: Locale) -> String {
    let users = users_label(count, locale);
    match (locale, branches) {
        (Locale::En, 1) => format!("1 branch, {}", users),
        (Locale::En, n) => format!("{} branches, {}", n, users),
        (Locale::Ar, n) => format!("{} فرع، {}", n, users),
    }
}

fn roles_label(roles: &BTreeSet<RoleTag>, count: usize, locale: Locale) -> String {
    if roles.is_empty() {
        return match locale {
            Locale::En => "No roles selected".to_string(),
            Locale::Ar => "لم يتم اختيار أي دور".to_string(),
        };
    }
    let separator = match locale {
        Locale::En => ", ",
        Locale::Ar => "، ",
    };
    let names: Vec<String> = roles.iter().map(|r| r.display_name(locale)).collect();
    format!("{} ({})", names.join(separator), count)
}

// ============================================================================
// Projection
// ============================================================================

/// Count, label and breakdown for the current selection.
pub fn summarize(selection: &AudienceSelection, directory: &Directory, locale: Locale) -> AudienceSummary {
    let mut report = ResolutionReport::default();
    let swept = sweep(selection, directory, &mut report);
    let count = collect_accounts(&swept, &mut report).len();

    let mut per_role: BTreeMap<&RoleTag, BTreeSet<&PersonId>> = BTreeMap::new();
    let mut touched: BTreeSet<&BranchId> = BTreeSet::new();
    for person in &swept {
        per_role.entry(&person.role).or_default().insert(&person.id);
        if let Some(branch) = &person.branch_id {
            touched.insert(branch);
        }
    }
    let role_breakdown = per_role
        .into_iter()
        .map(|(role, people)| RoleCount {
            role: role.clone(),
            count: people.len(),
        })
        .collect();

    let (branch_count, label) = match selection {
        AudienceSelection::All => (touched.len(), all_label(count, locale)),
        AudienceSelection::ByRole(roles) => (touched.len(), roles_label(roles, count, locale)),
        AudienceSelection::ByBranchRole(branches) => {
            (branches.len(), branches_label(branches.len(), count, locale))
        }
        AudienceSelection::ByUser(_) => (touched.len(), users_label(count, locale)),
    };

    AudienceSummary {
        count,
        label,
        branch_count,
        role_breakdown,
    }
}

// ============================================================================
// Tree states
// ============================================================================

/// State of a branch checkbox: checked when every role present in the
/// branch is selected, partial when anything inside it is.
pub fn branch_state(selection: &AudienceSelection, directory: &Directory, branch: &BranchId) -> TriState {
    let Some(picked) = selection.branch(branch) else {
        return TriState::Unchecked;
    };
    let present = directory.branch_roles(branch);
    if !present.is_empty() && present.iter().all(|r| picked.roles.contains(r)) {
        TriState::Checked
    } else if picked.is_empty() {
        TriState::Unchecked
    } else {
        TriState::Partial
    }
}

/// State of a role node under a branch: checked when the role itself is
/// selected or every person under it was picked individually, partial
/// when only some were.
pub fn role_state(
    selection: &AudienceSelection,
    directory: &Directory,
    branch: &BranchId,
    role: &RoleTag,
) -> TriState {
    let Some(picked) = selection.branch(branch) else {
        return TriState::Unchecked;
    };
    if picked.roles.contains(role) {
        return TriState::Checked;
    }

    let mut total = 0;
    let mut chosen = 0;
    for person in directory.people_in_branch(branch).filter(|p| &p.role == role) {
        total += 1;
        if picked.users.contains(&person.id) {
            chosen += 1;
        }
    }
    match chosen {
        0 => TriState::Unchecked,
        n if n == total => TriState::Checked,
        _ => TriState::Partial,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Scope;
    use crate::fixtures::{academy, all_selections, b1, b2};
    use crate::models::{DisplayName, PersonRecord};
    use crate::resolver::resolve;
    use crate::selection::SelectionMode;

    #[test]
    fn test_count_matches_resolver() {
        let d = academy();
        for selection in all_selections() {
            for locale in [Locale::En, Locale::Ar] {
                let summary = summarize(&selection, &d, locale);
                assert_eq!(summary.count, resolve(&selection, &d).len(), "{:?}", selection);
            }
        }
    }

    #[test]
    fn test_coaches_label() {
        let directory = Directory::from_records(
            Scope::Global,
            Vec::new(),
            ["c1", "c2", "c3"]
                .iter()
                .map(|id| PersonRecord::new(*id, RoleTag::Coach, DisplayName::default())),
        );
        let summary = summarize(&AudienceSelection::roles([RoleTag::Coach]), &directory, Locale::En);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.label, "Coaches (3)");
        assert_eq!(summary.role_breakdown, vec![RoleCount { role: RoleTag::Coach, count: 3 }]);
    }

    #[test]
    fn test_labels_per_mode() {
        let d = academy();

        let all = summarize(&AudienceSelection::All, &d, Locale::En);
        assert_eq!(all.label, format!("All users ({})", all.count));
        assert_eq!(all.branch_count, 2);

        let users = summarize(&AudienceSelection::users(["c1", "c2"]), &d, Locale::En);
        assert_eq!(users.label, "2 users");

        let one = summarize(&AudienceSelection::users(["c1"]), &d, Locale::En);
        assert_eq!(one.label, "1 user");

        let mut branches = AudienceSelection::empty(SelectionMode::ByBranchRole);
        branches.toggle_branch_role(b1(), RoleTag::Parent);
        branches.toggle_user(Some(&b2()), PersonId::from("playerX"));
        let summary = summarize(&branches, &d, Locale::En);
        assert_eq!(summary.label, "2 branches, 3 users");
        assert_eq!(summary.branch_count, 2);
    }

    #[test]
    fn test_arabic_labels() {
        let d = academy();
        let summary = summarize(&AudienceSelection::roles([RoleTag::Coach]), &d, Locale::Ar);
        assert_eq!(summary.label, "المدربون (2)");
    }

    #[test]
    fn test_breakdown_counts_people_not_accounts() {
        let d = academy();
        let summary = summarize(&AudienceSelection::users(["P1", "P4", "parentA"]), &d, Locale::En);
        assert_eq!(summary.count, 1);
        assert_eq!(
            summary.role_breakdown,
            vec![
                RoleCount { role: RoleTag::Parent, count: 1 },
                RoleCount { role: RoleTag::Player, count: 2 },
            ]
        );
    }

    #[test]
    fn test_empty_summary() {
        let d = academy();
        let summary = summarize(&AudienceSelection::empty(SelectionMode::ByRole), &d, Locale::En);
        assert!(summary.is_empty());
        assert_eq!(summary.label, "No roles selected");

        let unreachable = summarize(&AudienceSelection::users(["P3"]), &d, Locale::En);
        assert!(unreachable.is_empty());
    }

    #[test]
    fn test_branch_state_follows_toggles() {
        let d = academy();
        let mut s = AudienceSelection::empty(SelectionMode::ByBranchRole);
        assert_eq!(branch_state(&s, &d, &b1()), TriState::Unchecked);

        let roles = d.branch_roles(&b1());
        s.toggle_branch(&b1(), &roles);
        assert_eq!(branch_state(&s, &d, &b1()), TriState::Checked);

        s.toggle_branch_role(b1(), RoleTag::Coach);
        assert_eq!(branch_state(&s, &d, &b1()), TriState::Partial);

        s.toggle_branch(&b1(), &roles);
        assert_eq!(branch_state(&s, &d, &b1()), TriState::Checked);
        s.toggle_branch(&b1(), &roles);
        assert_eq!(branch_state(&s, &d, &b1()), TriState::Unchecked);

        s.toggle_user(Some(&b1()), PersonId::from("P1"));
        assert_eq!(branch_state(&s, &d, &b1()), TriState::Partial);
    }

    #[test]
    fn test_role_state_from_individual_picks() {
        let d = academy();
        let mut s = AudienceSelection::empty(SelectionMode::ByBranchRole);
        assert_eq!(role_state(&s, &d, &b1(), &RoleTag::Parent), TriState::Unchecked);

        s.toggle_user(Some(&b1()), PersonId::from("parentA"));
        assert_eq!(role_state(&s, &d, &b1(), &RoleTag::Parent), TriState::Partial);

        s.toggle_user(Some(&b1()), PersonId::from("parentB"));
        assert_eq!(role_state(&s, &d, &b1(), &RoleTag::Parent), TriState::Checked);

        s.toggle_branch_role(b1(), RoleTag::Coach);
        assert_eq!(role_state(&s, &d, &b1(), &RoleTag::Coach), TriState::Checked);
        assert_eq!(role_state(&s, &d, &b2(), &RoleTag::Coach), TriState::Unchecked);
    }

    #[test]
    fn test_states_outside_branch_mode() {
        let d = academy();
        let s = AudienceSelection::roles([RoleTag::Coach]);
        assert_eq!(branch_state(&s, &d, &b1()), TriState::Unchecked);
        assert_eq!(role_state(&s, &d, &b1(), &RoleTag::Coach), TriState::Unchecked);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let d = academy();
        let summary = summarize(&AudienceSelection::users(["c1"]), &d, Locale::En);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["branchCount"], 1);
        assert_eq!(json["roleBreakdown"][0]["role"], "coach");
    }
}
