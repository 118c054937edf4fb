use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{BranchId, DisplayName, PersonId, PersonRecord, RoleTag};

/// Administrative scope a directory snapshot was fetched for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "branch", rename_all = "lowercase")]
pub enum Scope {
    #[default]
    Global,
    Branch(BranchId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    pub id: BranchId,
    pub name: DisplayName,
}

// ============================================================================
// Wire shapes
// ============================================================================

/// Person entry as served by the directory endpoints. Inside role groups
/// the role and branch are implied by the enclosing keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPerson {
    pub id: PersonId,
    #[serde(default)]
    pub role: Option<RoleTag>,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<DisplayName>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(rename = "branchId", alias = "branch_id", default)]
    pub branch_id: Option<BranchId>,
    #[serde(rename = "accountId", alias = "account_id", default)]
    pub account_id: Option<PersonId>,
    #[serde(rename = "relatedAccountId", alias = "related_account_id", default)]
    pub related_account_id: Option<PersonId>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl RawPerson {
    /// Convert to a directory record, filling the role and branch from the
    /// group the entry was listed under when the entry itself omits them.
    pub fn to_record(&self, group_role: &RoleTag, group_branch: Option<&BranchId>) -> PersonRecord {
        let display_name = self.display_name.clone().unwrap_or_else(|| {
            DisplayName::new(
                self.name.clone().unwrap_or_default(),
                self.name_ar.clone().unwrap_or_default(),
            )
        });

        PersonRecord {
            id: self.id.clone(),
            role: self.role.clone().unwrap_or_else(|| group_role.clone()),
            display_name,
            branch_id: self.branch_id.clone().or_else(|| group_branch.cloned()),
            account_id: self.account_id.clone(),
            related_account_id: self.related_account_id.clone(),
            email: self.email.clone().filter(|e| !e.trim().is_empty()),
            phone: self.phone.clone().filter(|p| !p.trim().is_empty()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchNode {
    pub id: BranchId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub name_ar: Option<String>,
    #[serde(default)]
    pub groups: BTreeMap<RoleTag, Vec<RawPerson>>,
}

/// Global-scope response: branch tree plus flat role groups and counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryTree {
    #[serde(default)]
    pub branches: Vec<BranchNode>,
    #[serde(rename = "roleGroups", default)]
    pub role_groups: BTreeMap<RoleTag, Vec<RawPerson>>,
    #[serde(rename = "roleCounts", default)]
    pub role_counts: BTreeMap<RoleTag, usize>,
}

/// Branch-scope response: flat per-role lists.
pub type BranchLists = BTreeMap<RoleTag, Vec<RawPerson>>;

/// Either response shape, tagged with the scope it was fetched for. This
/// is what gets cached on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum DirectoryPayload {
    Tree(DirectoryTree),
    Branch { branch: BranchId, lists: BranchLists },
}

// ============================================================================
// Directory
// ============================================================================

/// Read-only candidate universe for one editing session.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    scope: Scope,
    branches: Vec<BranchInfo>,
    people: Vec<PersonRecord>,
    role_counts: BTreeMap<RoleTag, usize>,
    index: HashMap<PersonId, Vec<usize>>,
}

impl Directory {
    /// Build from already-converted records. A person listed twice under
    /// the same role and branch is kept once, first occurrence wins; a
    /// branchless listing of someone already placed in a branch is dropped.
    pub fn from_records(
        scope: Scope,
        branches: Vec<BranchInfo>,
        records: impl IntoIterator<Item = PersonRecord>,
    ) -> Self {
        let mut directory = Directory {
            scope,
            branches,
            ..Default::default()
        };
        for record in records {
            directory.insert(record);
        }
        directory
    }

    pub fn from_tree(tree: &DirectoryTree) -> Self {
        let branches = tree
            .branches
            .iter()
            .map(|b| BranchInfo {
                id: b.id.clone(),
                name: DisplayName::new(b.name.clone(), b.name_ar.clone().unwrap_or_default()),
            })
            .collect();

        let in_branches = tree.branches.iter().flat_map(|b| {
            b.groups
                .iter()
                .flat_map(move |(role, people)| people.iter().map(move |p| p.to_record(role, Some(&b.id))))
        });
        let in_groups = tree
            .role_groups
            .iter()
            .flat_map(|(role, people)| people.iter().map(move |p| p.to_record(role, None)));

        let mut directory = Self::from_records(Scope::Global, branches, in_branches.chain(in_groups));
        directory.role_counts = tree.role_counts.clone();
        debug!(
            branches = directory.branches.len(),
            people = directory.people.len(),
            "Built global directory"
        );
        directory
    }

    pub fn from_branch_lists(branch: &BranchId, lists: &BranchLists) -> Self {
        let records = lists
            .iter()
            .flat_map(|(role, people)| people.iter().map(move |p| p.to_record(role, Some(branch))))
            // Branch endpoints occasionally echo another branch id on shared
            // staff; inside this scope they belong to this branch.
            .map(|mut r| {
                r.branch_id = Some(branch.clone());
                r
            });
        let directory = Self::from_records(Scope::Branch(branch.clone()), Vec::new(), records);
        debug!(branch = %branch, people = directory.people.len(), "Built branch directory");
        directory
    }

    pub fn from_payload(payload: &DirectoryPayload) -> Self {
        match payload {
            DirectoryPayload::Tree(tree) => Self::from_tree(tree),
            DirectoryPayload::Branch { branch, lists } => Self::from_branch_lists(branch, lists),
        }
    }

    /// Combine single-branch snapshots into one global view.
    pub fn assemble(parts: impl IntoIterator<Item = (BranchInfo, Directory)>) -> Self {
        let mut branches = Vec::new();
        let mut records = Vec::new();
        for (info, part) in parts {
            branches.push(info);
            records.extend(part.people);
        }
        Self::from_records(Scope::Global, branches, records)
    }

    fn insert(&mut self, record: PersonRecord) {
        let slots = self.index.entry(record.id.clone()).or_default();
        let duplicate = slots.iter().any(|&i| {
            let existing = &self.people[i];
            existing.role == record.role
                && (existing.branch_id == record.branch_id || record.branch_id.is_none())
        });
        if duplicate {
            return;
        }
        slots.push(self.people.len());
        self.people.push(record);
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn branches(&self) -> &[BranchInfo] {
        &self.branches
    }

    pub fn branch(&self, id: &BranchId) -> Option<&BranchInfo> {
        self.branches.iter().find(|b| &b.id == id)
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

    /// Every record carrying this id (normally one).
    pub fn lookup<'a>(&'a self, id: &PersonId) -> impl Iterator<Item = &'a PersonRecord> + 'a {
        self.index
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&i| &self.people[i])
    }

    pub fn contains(&self, id: &PersonId) -> bool {
        self.index.contains_key(id)
    }

    /// Records of one role. The returned iterator borrows only the directory.
    pub fn people_with_role(&self, role: &RoleTag) -> impl Iterator<Item = &PersonRecord> + '_ {
        let role = role.clone();
        self.people.iter().filter(move |p| p.role == role)
    }

    /// Records listed in one branch. The returned iterator borrows only the
    /// directory.
    pub fn people_in_branch(&self, branch: &BranchId) -> impl Iterator<Item = &PersonRecord> + '_ {
        let branch = branch.clone();
        self.people.iter().filter(move |p| p.belongs_to(&branch))
    }

    /// Roles that actually occur in a branch, in role order.
    pub fn branch_roles(&self, branch: &BranchId) -> Vec<RoleTag> {
        let mut roles: Vec<RoleTag> = self
            .people_in_branch(branch)
            .map(|p| p.role.clone())
            .collect();
        roles.sort();
        roles.dedup();
        roles
    }

    /// Per-role head counts. Server-provided counts win; otherwise distinct
    /// people are counted, so staff listed in several branches count once.
    pub fn role_counts(&self) -> BTreeMap<RoleTag, usize> {
        if !self.role_counts.is_empty() {
            return self.role_counts.clone();
        }
        let mut people: BTreeMap<&RoleTag, BTreeSet<&PersonId>> = BTreeMap::new();
        for person in &self.people {
            people.entry(&person.role).or_default().insert(&person.id);
        }
        people
            .into_iter()
            .map(|(role, ids)| (role.clone(), ids.len()))
            .collect()
    }
}
