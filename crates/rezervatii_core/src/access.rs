//! Role-based permission gate for record mutations.
//!
//! # Responsibility
//! - Map roles to allowed actions per record kind.
//! - Keep staff status in sync with the administrator role.
//!
//! # Invariants
//! - Administrators may do everything on every record kind.
//! - Contributors view everything and add/change occurrences and site
//!   habitats only; they never delete.
//! - Viewers only view.
//! - Denial is an error value, never a panic.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Administrator,
    Contributor,
    Viewer,
}

/// Group name for administrators.
pub const ROLE_ADMINISTRATOR: &str = "administrator";
/// Group name for contributors.
pub const ROLE_CONTRIBUTOR: &str = "contributor";
/// Group name for viewers.
pub const ROLE_VIEWER: &str = "viewer";

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Administrator => ROLE_ADMINISTRATOR,
            Self::Contributor => ROLE_CONTRIBUTOR,
            Self::Viewer => ROLE_VIEWER,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AccessError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "administrator" | "administrators" | "admin" => Ok(Self::Administrator),
            "contributor" | "contributors" => Ok(Self::Contributor),
            "viewer" | "viewers" => Ok(Self::Viewer),
            other => Err(AccessError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    Add,
    Change,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Add => "add",
            Self::Change => "change",
            Self::Delete => "delete",
        }
    }
}

/// Every persisted record kind guarded by [`authorize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Species,
    Reserve,
    Association,
    ReserveAssociationYear,
    Occurrence,
    Habitat,
    Site,
    SiteHabitat,
}

impl RecordKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Species => "species",
            Self::Reserve => "reserve",
            Self::Association => "association",
            Self::ReserveAssociationYear => "reserve_association_year",
            Self::Occurrence => "occurrence",
            Self::Habitat => "habitat",
            Self::Site => "site",
            Self::SiteHabitat => "site_habitat",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    Forbidden {
        role: Role,
        action: Action,
        kind: RecordKind,
    },
    UnknownRole(String),
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forbidden { role, action, kind } => write!(
                f,
                "role `{role}` may not {} {} records",
                action.as_str(),
                kind.as_str()
            ),
            Self::UnknownRole(value) => write!(
                f,
                "unknown role `{value}`; expected administrator|contributor|viewer"
            ),
        }
    }
}

impl Error for AccessError {}

/// Returns whether `role` may perform `action` on `kind`.
pub fn is_allowed(role: Role, action: Action, kind: RecordKind) -> bool {
    match role {
        Role::Administrator => true,
        Role::Contributor => match action {
            Action::View => true,
            Action::Add | Action::Change => {
                matches!(kind, RecordKind::Occurrence | RecordKind::SiteHabitat)
            }
            Action::Delete => false,
        },
        Role::Viewer => action == Action::View,
    }
}

pub fn authorize(role: Role, action: Action, kind: RecordKind) -> Result<(), AccessError> {
    if is_allowed(role, action, kind) {
        return Ok(());
    }
    Err(AccessError::Forbidden { role, action, kind })
}

/// Account metadata relevant to permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAccount {
    pub username: String,
    pub role: Role,
    pub is_active: bool,
    /// Mirrors administrator membership.
    pub is_staff: bool,
}

impl UserAccount {
    /// New accounts are active contributors without staff status.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: Role::Contributor,
            is_active: true,
            is_staff: false,
        }
    }

    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.is_staff = role == Role::Administrator;
    }

    pub fn authorize(&self, action: Action, kind: RecordKind) -> Result<(), AccessError> {
        authorize(self.role, action, kind)
    }
}

#[cfg(test)]
mod tests {
    use super::{authorize, is_allowed, AccessError, Action, RecordKind, Role, UserAccount};

    const ALL_KINDS: [RecordKind; 8] = [
        RecordKind::Species,
        RecordKind::Reserve,
        RecordKind::Association,
        RecordKind::ReserveAssociationYear,
        RecordKind::Occurrence,
        RecordKind::Habitat,
        RecordKind::Site,
        RecordKind::SiteHabitat,
    ];

    #[test]
    fn administrators_may_do_everything() {
        for kind in ALL_KINDS {
            for action in [Action::View, Action::Add, Action::Change, Action::Delete] {
                assert!(is_allowed(Role::Administrator, action, kind));
            }
        }
    }

    #[test]
    fn contributors_edit_occurrences_and_site_habitats_only() {
        assert!(is_allowed(Role::Contributor, Action::Add, RecordKind::Occurrence));
        assert!(is_allowed(Role::Contributor, Action::Change, RecordKind::SiteHabitat));
        assert!(!is_allowed(Role::Contributor, Action::Add, RecordKind::Species));
        for kind in ALL_KINDS {
            assert!(is_allowed(Role::Contributor, Action::View, kind));
            assert!(!is_allowed(Role::Contributor, Action::Delete, kind));
        }
    }

    #[test]
    fn viewers_only_view() {
        assert!(authorize(Role::Viewer, Action::View, RecordKind::Reserve).is_ok());
        assert_eq!(
            authorize(Role::Viewer, Action::Add, RecordKind::Occurrence),
            Err(AccessError::Forbidden {
                role: Role::Viewer,
                action: Action::Add,
                kind: RecordKind::Occurrence,
            })
        );
    }

    #[test]
    fn new_users_are_contributors_and_staff_follows_admin_role() {
        let mut user = UserAccount::new("ana");
        assert_eq!(user.role, Role::Contributor);
        assert!(user.is_active);
        assert!(!user.is_staff);

        user.set_role(Role::Administrator);
        assert!(user.is_staff);
        user.set_role(Role::Viewer);
        assert!(!user.is_staff);
    }

    #[test]
    fn roles_parse_group_names() {
        assert_eq!("Administrators".parse::<Role>(), Ok(Role::Administrator));
        assert_eq!(" contributor ".parse::<Role>(), Ok(Role::Contributor));
        assert!("guest".parse::<Role>().is_err());
    }
}
