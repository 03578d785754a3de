use serde::{Serialize, Serializer};
use std::fmt;

/// Canonical actor role as seen by the workflow.
///
/// Directory entries carry free-form role strings with several spellings
/// for the same function; [`Role::normalize`] folds them into one value so
/// the transition table never compares raw strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    HrManager,
    HrDirector,
    PlantManager,
    Requester,
    Other(String),
}

const SYNONYMS: &[(Role, &[&str])] = &[
    (
        Role::HrManager,
        &["HR_MANAGER", "Responsable RH", "Responsable RH (TTG)"],
    ),
    (
        Role::HrDirector,
        &["HR_DIRECTOR", "Directeur RH", "DRH", "DRH (TTG)"],
    ),
    (
        Role::PlantManager,
        &[
            "PLANT_MANAGER",
            "Plant Manager",
            "Direction",
            "Plant Manager (TTG)",
        ],
    ),
    (Role::Requester, &["DEMANDEUR", "REQUESTER"]),
];

impl Role {
    pub fn normalize(raw: &str) -> Role {
        let trimmed = raw.trim();
        SYNONYMS
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|a| a.eq_ignore_ascii_case(trimmed)))
            .map(|(role, _)| role.clone())
            .unwrap_or_else(|| Role::Other(trimmed.to_string()))
    }

    /// Identifier used in logs, the transition trail and error messages.
    pub fn as_str(&self) -> &str {
        match self {
            Role::HrManager => "HR_MANAGER",
            Role::HrDirector => "HR_DIRECTOR",
            Role::PlantManager => "PLANT_MANAGER",
            Role::Requester => "REQUESTER",
            Role::Other(raw) => raw,
        }
    }

    /// Raw spellings that normalize to this role.
    pub fn aliases(&self) -> &'static [&'static str] {
        SYNONYMS
            .iter()
            .find(|(role, _)| role == self)
            .map(|(_, aliases)| *aliases)
            .unwrap_or(&[])
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_fold_to_one_role() {
        for raw in ["HR_MANAGER", "Responsable RH", "responsable rh (ttg)", "  hr_manager "] {
            assert_eq!(Role::normalize(raw), Role::HrManager, "{raw}");
        }
        for raw in ["Directeur RH", "DRH", "DRH (TTG)"] {
            assert_eq!(Role::normalize(raw), Role::HrDirector, "{raw}");
        }
        for raw in ["PLANT_MANAGER", "Plant Manager", "Direction", "Plant Manager (TTG)"] {
            assert_eq!(Role::normalize(raw), Role::PlantManager, "{raw}");
        }
        assert_eq!(Role::normalize("DEMANDEUR"), Role::Requester);
    }

    #[test]
    fn unknown_roles_are_kept_verbatim() {
        assert_eq!(Role::normalize(" Recruiter "), Role::Other("Recruiter".into()));
        assert_eq!(Role::normalize("Recruiter").as_str(), "Recruiter");
    }

    #[test]
    fn canonical_names_round_trip() {
        for role in [Role::HrManager, Role::HrDirector, Role::PlantManager, Role::Requester] {
            assert_eq!(Role::normalize(role.as_str()), role);
            assert!(!role.aliases().is_empty());
        }
    }
}
