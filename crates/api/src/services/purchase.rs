//! Purchase flow.

use chrono::Utc;
use thiserror::Error;

use tienda_core::{UserId, ValidationErrors};

use crate::db::{ClientStore, ProductStore, RepositoryError};
use crate::models::{ClientInput, ClientProfile, NewPurchase};

/// Errors that can occur while executing a purchase.
#[derive(Debug, Error)]
pub enum PurchaseError {
    /// No product has the requested reference.
    #[error("product '{0}' not found")]
    ProductNotFound(String),

    /// First purchase without the data needed to create a client profile.
    #[error("missing client details: {0}")]
    MissingClientDetails(ValidationErrors),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Executes purchases for authenticated users.
pub struct PurchaseService<'a, S> {
    store: &'a S,
}

impl<'a, S: ProductStore + ClientStore> PurchaseService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Buy the product with reference `product_reference` for `user_id`.
    ///
    /// A user without a client profile gets one created from `details`;
    /// for a returning client `details` is ignored. The price paid is the
    /// product's price at this moment.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError::ProductNotFound` for an unknown reference,
    /// `PurchaseError::MissingClientDetails` when a first purchase lacks
    /// contact fields, and `PurchaseError::Repository` on store failures.
    pub async fn execute(
        &self,
        user_id: UserId,
        product_reference: &str,
        details: ClientInput,
    ) -> Result<ClientProfile, PurchaseError> {
        let product = self
            .store
            .find_product(product_reference)
            .await?
            .ok_or_else(|| PurchaseError::ProductNotFound(product_reference.to_owned()))?;

        let provision = match self.store.find_client(user_id).await? {
            Some(_) => None,
            None => Some(
                details
                    .into_purchase_profile(user_id)
                    .map_err(PurchaseError::MissingClientDetails)?,
            ),
        };
        let provisioned = provision.is_some();

        let purchase = NewPurchase {
            product_id: product.id,
            product_reference: product.reference.clone(),
            price_paid: product.price,
            purchased_at: Utc::now(),
        };
        let client = self
            .store
            .record_purchase(user_id, provision, purchase)
            .await?;

        tracing::info!(
            user_id = %user_id,
            product = %product.reference,
            price = %product.price,
            new_client = provisioned,
            "Purchase recorded"
        );

        Ok(client)
    }
}
