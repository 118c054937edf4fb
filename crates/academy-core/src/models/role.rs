use std::fmt;

use serde::{Deserialize, Serialize};

use super::Locale;

/// Role vocabulary of the academy directory.
///
/// Server-defined roles the client does not know yet are kept verbatim in
/// `Other` so selections containing them survive a decode/encode cycle.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoleTag {
    BranchAdmin,
    Coach,
    Accountant,
    Parent,
    Player,
    Other(String),
}

impl RoleTag {
    /// Roles offered in the super-admin (all branches) context.
    pub const GLOBAL_SCOPE: [RoleTag; 5] = [
        RoleTag::BranchAdmin,
        RoleTag::Coach,
        RoleTag::Accountant,
        RoleTag::Parent,
        RoleTag::Player,
    ];

    /// Roles offered inside a single branch.
    pub const BRANCH_SCOPE: [RoleTag; 3] = [RoleTag::Coach, RoleTag::Parent, RoleTag::Player];

    pub fn as_str(&self) -> &str {
        match self {
            RoleTag::BranchAdmin => "branch_admin",
            RoleTag::Coach => "coach",
            RoleTag::Accountant => "accountant",
            RoleTag::Parent => "parent",
            RoleTag::Player => "player",
            RoleTag::Other(tag) => tag,
        }
    }

    pub fn is_player(&self) -> bool {
        matches!(self, RoleTag::Player)
    }

    /// Parse the legacy plural shorthand used by old `target_audience`
    /// strings ("parents", "coaches", ...). Singular tags are accepted too.
    pub fn from_legacy(raw: &str) -> Self {
        let tag = raw.trim().to_ascii_lowercase();
        match tag.as_str() {
            "parents" => RoleTag::Parent,
            "coaches" => RoleTag::Coach,
            "players" => RoleTag::Player,
            "accountants" => RoleTag::Accountant,
            "branch_admins" | "branch-admins" | "branchadmins" => RoleTag::BranchAdmin,
            _ => RoleTag::from(tag),
        }
    }

    /// Plural label for summaries and tree headers.
    pub fn display_name(&self, locale: Locale) -> String {
        let label = match (self, locale) {
            (RoleTag::BranchAdmin, Locale::En) => "Branch admins",
            (RoleTag::BranchAdmin, Locale::Ar) => "مديرو الفروع",
            (RoleTag::Coach, Locale::En) => "Coaches",
            (RoleTag::Coach, Locale::Ar) => "المدربون",
            (RoleTag::Accountant, Locale::En) => "Accountants",
            (RoleTag::Accountant, Locale::Ar) => "المحاسبون",
            (RoleTag::Parent, Locale::En) => "Parents",
            (RoleTag::Parent, Locale::Ar) => "أولياء الأمور",
            (RoleTag::Player, Locale::En) => "Players",
            (RoleTag::Player, Locale::Ar) => "اللاعبون",
            (RoleTag::Other(tag), _) => return tag.replace('_', " "),
        };
        label.to_string()
    }
}

impl From<String> for RoleTag {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "branch_admin" => RoleTag::BranchAdmin,
            "coach" => RoleTag::Coach,
            "accountant" => RoleTag::Accountant,
            "parent" => RoleTag::Parent,
            "player" => RoleTag::Player,
            _ => RoleTag::Other(tag),
        }
    }
}

impl From<&str> for RoleTag {
    fn from(tag: &str) -> Self {
        RoleTag::from(tag.to_string())
    }
}

impl From<RoleTag> for String {
    fn from(role: RoleTag) -> Self {
        match role {
            RoleTag::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for RoleTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
