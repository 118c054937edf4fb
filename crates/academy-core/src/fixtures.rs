//! Shared directory and selection fixtures for resolver and summary tests.

use crate::directory::{BranchInfo, Directory, Scope};
use crate::models::{BranchId, DisplayName, PersonId, PersonRecord, RoleTag};
use crate::selection::{AudienceSelection, BranchSelection, SelectionMode};

pub fn b1() -> BranchId {
    BranchId::from("b1")
}

pub fn b2() -> BranchId {
    BranchId::from("b2")
}

fn person(id: &str, role: RoleTag, name: &str) -> PersonRecord {
    PersonRecord::new(id, role, DisplayName::new(name, ""))
}

/// Two branches:
///
/// - b1: branch admin `ba1`, coach `c1`, parents `parentA`/`parentB`,
///   players `P1` (parentA only) and `P2` (own login `playerAcctB` + parentB)
/// - b2: coach `c2`, parent `parentX`, players `P3` (no accounts),
///   `P4` (parentA, a sibling of P1) and `playerX` (parentX only)
/// - no branch: accountant `acc1`
pub fn academy() -> Directory {
    let branches = vec![
        BranchInfo { id: b1(), name: DisplayName::new("Downtown", "وسط المدينة") },
        BranchInfo { id: b2(), name: DisplayName::new("Seaside", "الشاطئ") },
    ];
    Directory::from_records(
        Scope::Global,
        branches,
        vec![
            person("ba1", RoleTag::BranchAdmin, "Nadia").in_branch("b1"),
            person("c1", RoleTag::Coach, "Sami").in_branch("b1"),
            person("parentA", RoleTag::Parent, "Khaled").in_branch("b1"),
            person("parentB", RoleTag::Parent, "Mona").in_branch("b1"),
            person("P1", RoleTag::Player, "Omar")
                .in_branch("b1")
                .with_related_account("parentA"),
            person("P2", RoleTag::Player, "Lina")
                .in_branch("b1")
                .with_account("playerAcctB")
                .with_related_account("parentB"),
            person("c2", RoleTag::Coach, "Rana").in_branch("b2"),
            person("parentX", RoleTag::Parent, "Hassan").in_branch("b2"),
            person("P3", RoleTag::Player, "Youssef").in_branch("b2"),
            person("P4", RoleTag::Player, "Adam")
                .in_branch("b2")
                .with_related_account("parentA"),
            person("playerX", RoleTag::Player, "Ziad")
                .in_branch("b2")
                .with_related_account("parentX"),
            person("acc1", RoleTag::Accountant, "Huda"),
        ],
    )
}

fn subsets<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    (0..1u32 << items.len())
        .map(|mask| {
            items
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, item)| item.clone())
                .collect()
        })
        .collect()
}

/// Every selection over the fixture vocabulary, including stale ids,
/// misplaced users and an unknown role.
pub fn all_selections() -> Vec<AudienceSelection> {
    let mut selections = vec![AudienceSelection::All];

    let mut roles: Vec<RoleTag> = RoleTag::GLOBAL_SCOPE.to_vec();
    roles.push(RoleTag::from("physio"));
    for subset in subsets(&roles) {
        selections.push(AudienceSelection::roles(subset));
    }

    let users: Vec<PersonId> = ["P1", "P2", "P3", "P4", "c1", "parentA", "acc1", "ghost"]
        .iter()
        .map(|id| PersonId::from(*id))
        .collect();
    for subset in subsets(&users) {
        selections.push(AudienceSelection::users(subset));
    }

    let branch_roles = subsets(&RoleTag::BRANCH_SCOPE);
    let branch_users = subsets(&[PersonId::from("P1"), PersonId::from("playerX"), PersonId::from("ghost")]);
    let mut per_branch = Vec::new();
    for roles in &branch_roles {
        for users in &branch_users {
            per_branch.push(BranchSelection {
                roles: roles.iter().cloned().collect(),
                users: users.iter().cloned().collect(),
            });
        }
    }
    for first in &per_branch {
        for second in per_branch.iter().step_by(3) {
            let mut selection = AudienceSelection::empty(SelectionMode::ByBranchRole);
            if let AudienceSelection::ByBranchRole(map) = &mut selection {
                if !first.is_empty() {
                    map.insert(b1(), first.clone());
                }
                if !second.is_empty() {
                    map.insert(b2(), second.clone());
                }
            }
            selections.push(selection);
        }
    }

    selections
}
