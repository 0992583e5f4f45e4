//! User models.

use chrono::{DateTime, NaiveDate, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use tienda_core::{Email, Role, UserId, ValidationErrors, parse_date};

use crate::services::auth::validate_password;

/// A user as returned to clients. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: UserId,
    #[serde(rename = "nombreCompleto")]
    pub full_name: String,
    #[serde(rename = "correo")]
    pub email: Email,
    #[serde(rename = "rol")]
    pub role: Role,
    #[serde(rename = "fechaNacimiento")]
    pub birth_date: Option<NaiveDate>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Public fields embedded in client listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserSummary {
    #[serde(rename = "nombreCompleto")]
    pub full_name: String,
    #[serde(rename = "correo")]
    pub email: Email,
    #[serde(rename = "rol")]
    pub role: Role,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// A user together with the stored password hash, for login only.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// A user ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub full_name: String,
    pub email: Email,
    pub password_hash: String,
    pub role: Role,
    pub birth_date: Option<NaiveDate>,
}

/// Partial update of a user. The password is not part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub full_name: Option<String>,
    pub email: Option<Email>,
    pub role: Option<Role>,
    pub birth_date: Option<NaiveDate>,
}

/// Validated sign-up data with the password still in plain text.
#[derive(Debug)]
pub struct Registration {
    pub full_name: String,
    pub email: Email,
    pub password: SecretString,
    pub role: Role,
    pub birth_date: Option<NaiveDate>,
}

impl Registration {
    /// Pair the registration with its computed hash.
    #[must_use]
    pub fn into_new_user(self, password_hash: String) -> NewUser {
        NewUser {
            full_name: self.full_name,
            email: self.email,
            password_hash,
            role: self.role,
            birth_date: self.birth_date,
        }
    }
}

/// Raw user payload as sent by clients.
///
/// Used by registration, `POST /usuarios` and `PUT /usuarios/{email}`.
/// English field names are accepted as aliases. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(alias = "fullName")]
    pub nombre_completo: Option<String>,
    #[serde(alias = "email")]
    pub correo: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "birthDate")]
    pub fecha_nacimiento: Option<String>,
    #[serde(alias = "role")]
    pub rol: Option<String>,
}

impl UserInput {
    /// Validate a payload for account creation.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn into_registration(self) -> Result<Registration, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let full_name = errors.require(
            "nombreCompleto",
            self.nombre_completo.as_deref(),
            "El nombre completo es obligatorio.",
        );
        let email = errors.check("correo", Email::parse(self.correo.as_deref().unwrap_or("")));
        let password = match self.password {
            Some(p) if !p.is_empty() => errors
                .check("password", validate_password(&p))
                .map(|()| SecretString::from(p)),
            _ => {
                errors.push("password", "La contraseña es obligatoria.");
                None
            }
        };
        let role = match self.rol.as_deref().map(str::trim) {
            None | Some("") => Some(Role::default()),
            Some(raw) => errors.check("rol", raw.parse::<Role>()),
        };
        let birth_date = optional_date(&mut errors, self.fecha_nacimiento.as_deref());

        match (full_name, email, password, role, birth_date) {
            (Some(full_name), Some(email), Some(password), Some(role), Some(birth_date))
                if errors.is_empty() =>
            {
                Ok(Registration {
                    full_name,
                    email,
                    password,
                    role,
                    birth_date,
                })
            }
            _ => Err(errors),
        }
    }

    /// Validate a payload for a partial update. `password` is ignored.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn into_changes(self) -> Result<UserChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut changes = UserChanges::default();

        if let Some(name) = self.nombre_completo {
            changes.full_name = errors.require(
                "nombreCompleto",
                Some(&name),
                "El nombre completo es obligatorio.",
            );
        }
        if let Some(raw) = self.correo {
            changes.email = errors.check("correo", Email::parse(&raw));
        }
        if let Some(raw) = self.rol {
            changes.role = errors.check("rol", raw.trim().parse::<Role>());
        }
        changes.birth_date =
            optional_date(&mut errors, self.fecha_nacimiento.as_deref()).flatten();

        errors.into_result(changes)
    }
}

/// Parse an optional date. `None` in the outer option means the value was
/// present but invalid.
fn optional_date(errors: &mut ValidationErrors, raw: Option<&str>) -> Option<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Some(None),
        Some(raw) => errors.check("fechaNacimiento", parse_date(raw)).map(Some),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    fn input(name: &str, email: &str, password: &str) -> UserInput {
        UserInput {
            nombre_completo: Some(name.to_owned()),
            correo: Some(email.to_owned()),
            password: Some(password.to_owned()),
            ..UserInput::default()
        }
    }

    #[test]
    fn test_registration_defaults_role() {
        let registration = input("Ana", "Ana@X.com", "password123")
            .into_registration()
            .unwrap();
        assert_eq!(registration.email.as_str(), "ana@x.com");
        assert_eq!(registration.role, Role::BasicUser);
        assert_eq!(registration.password.expose_secret(), "password123");
        assert!(registration.birth_date.is_none());
    }

    #[test]
    fn test_registration_accepts_english_field_names() {
        let body = serde_json::json!({
            "fullName": "Ana",
            "correo": "ana@x.com",
            "password": "password123",
            "birthDate": "1990-05-17",
        });
        let registration = serde_json::from_value::<UserInput>(body)
            .unwrap()
            .into_registration()
            .unwrap();
        assert_eq!(registration.full_name, "Ana");
        assert_eq!(registration.email.as_str(), "ana@x.com");
        assert!(registration.birth_date.is_some());
    }

    #[test]
    fn test_registration_collects_all_errors() {
        let errors = UserInput {
            rol: Some("jefe".to_owned()),
            fecha_nacimiento: Some("ayer".to_owned()),
            ..input("", "not-an-email", "short")
        }
        .into_registration()
        .unwrap_err();

        assert_eq!(
            errors.fields(),
            vec!["nombreCompleto", "correo", "password", "rol", "fechaNacimiento"]
        );
    }

    #[test]
    fn test_registration_requires_password() {
        let errors = UserInput {
            password: None,
            ..input("Ana", "ana@x.com", "")
        }
        .into_registration()
        .unwrap_err();
        assert_eq!(errors.fields(), vec!["password"]);
    }

    #[test]
    fn test_registration_accepts_explicit_role() {
        let registration = UserInput {
            rol: Some("empleado".to_owned()),
            fecha_nacimiento: Some("1990-05-17".to_owned()),
            ..input("Luis", "luis@x.com", "password123")
        }
        .into_registration()
        .unwrap();
        assert_eq!(registration.role, Role::Employee);
        assert_eq!(registration.birth_date, NaiveDate::from_ymd_opt(1990, 5, 17));
    }

    #[test]
    fn test_changes_ignore_password() {
        let changes = UserInput {
            password: Some("x".to_owned()),
            nombre_completo: Some("Ana María".to_owned()),
            ..UserInput::default()
        }
        .into_changes()
        .unwrap();
        assert_eq!(changes.full_name.as_deref(), Some("Ana María"));
        assert!(changes.email.is_none());
    }

    #[test]
    fn test_changes_reject_blank_name() {
        let errors = UserInput {
            nombre_completo: Some("  ".to_owned()),
            ..UserInput::default()
        }
        .into_changes()
        .unwrap_err();
        assert_eq!(errors.fields(), vec!["nombreCompleto"]);
    }
}
