//! Subcommand implementations.

pub mod migrate;
pub mod seed;
pub mod user;

use secrecy::SecretString;

/// Database URL from `API_DATABASE_URL`, falling back to `DATABASE_URL`.
///
/// Loads `.env` first, like the servers do.
fn database_url() -> Option<SecretString> {
    dotenvy::dotenv().ok();

    ["API_DATABASE_URL", "DATABASE_URL"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
        .map(SecretString::from)
}
