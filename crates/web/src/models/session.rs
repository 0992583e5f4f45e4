//! Session-related types.
//!
//! Types stored in the session for authentication state.

use core::fmt;

use serde::{Deserialize, Serialize};

use tienda_core::{Role, UserId};

use super::api::UserView;

/// Session-stored user identity.
///
/// Holds the public fields shown in the header and the backend token that
/// is forwarded on every call needing identity.
#[derive(Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub nombre_completo: String,
    pub correo: String,
    pub rol: Role,
    /// Backend identity token.
    pub token: String,
}

impl CurrentUser {
    /// Build the session identity from a login response.
    #[must_use]
    pub fn new(user: UserView, token: String) -> Self {
        Self {
            id: user.id,
            nombre_completo: user.nombre_completo,
            correo: user.correo,
            rol: user.rol,
            token,
        }
    }

    /// First letter of the name, for the avatar button.
    #[must_use]
    pub fn initial(&self) -> String {
        self.nombre_completo
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default()
    }
}

impl fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentUser")
            .field("id", &self.id)
            .field("correo", &self.correo)
            .field("rol", &self.rol)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";
}
