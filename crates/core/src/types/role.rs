//! User roles.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a role name is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("rol no válido: '{0}'")]
pub struct RoleError(pub String);

/// Role attached to every user account.
///
/// Wire names are the Spanish snake-case identifiers used by the REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    /// Registered user without commerce data.
    #[default]
    #[serde(rename = "usuario_basico")]
    BasicUser,
    /// Customer.
    #[serde(rename = "cliente")]
    Client,
    /// Staff member.
    #[serde(rename = "empleado")]
    Employee,
    /// Administrator.
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    /// All roles, in privilege order.
    pub const ALL: [Self; 4] = [Self::BasicUser, Self::Client, Self::Employee, Self::Admin];

    /// The wire/database name of this role.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BasicUser => "usuario_basico",
            Self::Client => "cliente",
            Self::Employee => "empleado",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| RoleError(s.to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_basic_user() {
        assert_eq!(Role::default(), Role::BasicUser);
    }

    #[test]
    fn test_from_str_matches_serde_names() {
        for role in Role::ALL {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_unknown_role() {
        assert_eq!(
            "superuser".parse::<Role>(),
            Err(RoleError("superuser".to_owned()))
        );
    }
}
