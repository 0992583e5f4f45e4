//! Persistence for the backend.
//!
//! # Schema: `tienda`
//!
//! - `users` - accounts (unique `email`)
//! - `products` - catalog (unique `reference`)
//! - `clients` - client profiles (unique `user_id`, unique `document`)
//! - `purchases` - purchase history of each client
//!
//! Flows only see the store traits below. [`PgStore`] implements all of
//! them over a connection pool; tests use an in-memory implementation.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p tienda-cli -- migrate
//! ```

mod clients;
#[cfg(test)]
pub mod memory;
mod products;
mod users;

use std::future::Future;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use tienda_core::{Email, UserId};

use crate::models::{
    ClientChanges, ClientProfile, ClientWithUser, NewClient, NewProduct, NewPurchase, NewUser,
    Product, ProductChanges, ProductFilter, ResolvedPurchase, User, UserChanges, UserCredentials,
};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is invalid or corrupted.
    #[error("data integrity error: {0}")]
    DataCorruption(String),

    /// Record not found.
    #[error("record not found")]
    NotFound,

    /// A unique constraint was violated. Holds the wire name of the field.
    #[error("conflict on {0}")]
    Conflict(String),

    /// A referenced record does not exist. Holds the wire name of the field.
    #[error("missing reference: {0}")]
    MissingReference(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Store of user accounts.
pub trait UserStore: Send + Sync {
    /// All users, oldest first.
    fn list_users(&self) -> impl Future<Output = Result<Vec<User>, RepositoryError>> + Send;

    fn find_user_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn find_user_by_id(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// The user and the stored password hash.
    fn find_credentials(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<UserCredentials>, RepositoryError>> + Send;

    /// Insert a user. Fails with `Conflict("correo")` if the email is taken.
    fn create_user(
        &self,
        user: NewUser,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Apply `changes` to the user owning `email`. Returns `None` if absent.
    fn update_user(
        &self,
        email: &Email,
        changes: UserChanges,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Returns `true` if a user was deleted.
    fn delete_user(&self, email: &Email)
    -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// Store of catalog entries.
pub trait ProductStore: Send + Sync {
    fn list_products(
        &self,
        filter: ProductFilter,
    ) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    fn find_product(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Insert a product. Fails with `Conflict("referencia")` on a reused reference.
    fn create_product(
        &self,
        product: NewProduct,
    ) -> impl Future<Output = Result<Product, RepositoryError>> + Send;

    fn update_product(
        &self,
        reference: &str,
        changes: ProductChanges,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    fn delete_product(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

/// Store of client profiles and their purchase history.
pub trait ClientStore: Send + Sync {
    fn list_clients(
        &self,
    ) -> impl Future<Output = Result<Vec<ClientWithUser>, RepositoryError>> + Send;

    /// The profile owned by `user_id`, with stored history.
    fn find_client(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<ClientProfile>, RepositoryError>> + Send;

    /// The profile owned by `user_id` with the owner's public fields.
    fn find_client_with_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<ClientWithUser>, RepositoryError>> + Send;

    fn create_client(
        &self,
        client: NewClient,
    ) -> impl Future<Output = Result<ClientProfile, RepositoryError>> + Send;

    fn update_client(
        &self,
        user_id: UserId,
        changes: ClientChanges,
    ) -> impl Future<Output = Result<Option<ClientProfile>, RepositoryError>> + Send;

    fn delete_client(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Append a purchase to the history of `user_id` in one atomic step.
    ///
    /// When `provision` is given and the user has no profile yet, the
    /// profile is created first. If a concurrent request created it in the
    /// meantime, `provision` is discarded and the purchase lands on the
    /// existing profile.
    fn record_purchase(
        &self,
        user_id: UserId,
        provision: Option<NewClient>,
        purchase: NewPurchase,
    ) -> impl Future<Output = Result<ClientProfile, RepositoryError>> + Send;

    /// The profile of `user_id` with each history entry joined to its product.
    fn resolved_profile(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<ClientProfile<ResolvedPurchase>>, RepositoryError>> + Send;
}

/// `PostgreSQL` implementation of every store trait.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Classify a failed write: constraint violations become `Conflict` or
/// `MissingReference` naming the offending field.
pub(crate) fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        let field = constraint_field(db_err.constraint().unwrap_or_default()).to_owned();
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(field);
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::MissingReference(field);
        }
    }
    RepositoryError::Database(e)
}

/// Wire name of the field guarded by a constraint.
fn constraint_field(constraint: &str) -> &'static str {
    match constraint {
        "users_email_key" => "correo",
        "products_reference_key" => "referencia",
        "clients_user_id_key" | "clients_user_id_fkey" => "usuario",
        "clients_document_key" => "documento",
        "purchases_product_id_fkey" => "producto",
        _ => "registro",
    }
}
