//! Profile flow: a user together with their client profile.

use crate::db::{ClientStore, RepositoryError};
use crate::models::{ProfileView, User};

/// Builds the combined profile view.
pub struct ProfileService<'a, S> {
    store: &'a S,
}

impl<'a, S: ClientStore> ProfileService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// The user and their client profile, with every purchase joined to
    /// its product. A user who never bought anything gets `cliente: null`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the store fails.
    pub async fn get_profile(&self, user: User) -> Result<ProfileView, RepositoryError> {
        let client = self.store.resolved_profile(user.id).await?;
        Ok(ProfileView { user, client })
    }
}
