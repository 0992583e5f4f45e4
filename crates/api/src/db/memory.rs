//! In-memory store for tests.
//!
//! Mirrors the constraints of the `PostgreSQL` schema (unique email,
//! reference, owner and document) so flows behave the same against it.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use chrono::Utc;

use tienda_core::{ClientId, Email, ProductId, PurchaseId, UserId};

use super::{ClientStore, ProductStore, RepositoryError, UserStore};
use crate::models::{
    ClientChanges, ClientProfile, ClientWithUser, NewClient, NewProduct, NewPurchase, NewUser,
    Product, ProductChanges, ProductFilter, PurchaseEntry, ResolvedPurchase, User, UserChanges,
    UserCredentials, UserSummary,
};

#[derive(Default)]
struct Tables {
    users: Vec<UserCredentials>,
    products: Vec<Product>,
    clients: Vec<ClientProfile>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }
}

/// Store backed by vectors behind a mutex.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub fn user_count(&self) -> usize {
        self.tables.lock().unwrap().users.len()
    }

    /// Number of stored client profiles.
    pub fn client_count(&self) -> usize {
        self.tables.lock().unwrap().clients.len()
    }

    /// Stored hash for `email`, if any.
    pub fn password_hash(&self, email: &str) -> Option<String> {
        self.tables
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|c| c.user.email.as_str() == email)
            .map(|c| c.password_hash.clone())
    }
}

impl UserStore for MemoryStore {
    async fn list_users(&self) -> Result<Vec<User>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().map(|c| c.user.clone()).collect())
    }

    async fn find_user_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|c| &c.user.email == email)
            .map(|c| c.user.clone()))
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .users
            .iter()
            .find(|c| c.user.id == id)
            .map(|c| c.user.clone()))
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<UserCredentials>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|c| &c.user.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.users.iter().any(|c| c.user.email == user.email) {
            return Err(RepositoryError::Conflict("correo".to_owned()));
        }
        let now = Utc::now();
        let stored = User {
            id: UserId::new(tables.next_id()),
            full_name: user.full_name,
            email: user.email,
            role: user.role,
            birth_date: user.birth_date,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(UserCredentials {
            user: stored.clone(),
            password_hash: user.password_hash,
        });
        Ok(stored)
    }

    async fn update_user(
        &self,
        email: &Email,
        changes: UserChanges,
    ) -> Result<Option<User>, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(ref new_email) = changes.email
            && tables
                .users
                .iter()
                .any(|c| &c.user.email == new_email && &c.user.email != email)
        {
            return Err(RepositoryError::Conflict("correo".to_owned()));
        }
        let Some(entry) = tables.users.iter_mut().find(|c| &c.user.email == email) else {
            return Ok(None);
        };
        let user = &mut entry.user;
        if let Some(name) = changes.full_name {
            user.full_name = name;
        }
        if let Some(new_email) = changes.email {
            user.email = new_email;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if changes.birth_date.is_some() {
            user.birth_date = changes.birth_date;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, email: &Email) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(pos) = tables.users.iter().position(|c| &c.user.email == email) else {
            return Ok(false);
        };
        let removed = tables.users.remove(pos);
        tables.clients.retain(|c| c.user_id != removed.user.id);
        Ok(true)
    }
}

impl ProductStore for MemoryStore {
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .products
            .iter()
            .filter(|p| filter.published.is_none_or(|flag| p.published == flag))
            .cloned()
            .collect())
    }

    async fn find_product(&self, reference: &str) -> Result<Option<Product>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .products
            .iter()
            .find(|p| p.reference == reference)
            .cloned())
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if tables.products.iter().any(|p| p.reference == product.reference) {
            return Err(RepositoryError::Conflict("referencia".to_owned()));
        }
        let now = Utc::now();
        let stored = Product {
            id: ProductId::new(tables.next_id()),
            reference: product.reference,
            name: product.name,
            description: product.description,
            price: product.price,
            published: product.published,
            image_url: product.image_url,
            created_at: now,
            updated_at: now,
        };
        tables.products.push(stored.clone());
        Ok(stored)
    }

    async fn update_product(
        &self,
        reference: &str,
        changes: ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(product) = tables.products.iter_mut().find(|p| p.reference == reference) else {
            return Ok(None);
        };
        if let Some(v) = changes.reference {
            product.reference = v;
        }
        if let Some(v) = changes.name {
            product.name = v;
        }
        if changes.description.is_some() {
            product.description = changes.description;
        }
        if let Some(v) = changes.price {
            product.price = v;
        }
        if let Some(v) = changes.published {
            product.published = v;
        }
        if changes.image_url.is_some() {
            product.image_url = changes.image_url;
        }
        product.updated_at = Utc::now();
        Ok(Some(product.clone()))
    }

    async fn delete_product(&self, reference: &str) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let Some(pos) = tables.products.iter().position(|p| p.reference == reference) else {
            return Ok(false);
        };
        let removed = tables.products.remove(pos);
        for client in &mut tables.clients {
            for entry in &mut client.history {
                if entry.product_id == Some(removed.id) {
                    entry.product_id = None;
                }
            }
        }
        Ok(true)
    }
}

impl Tables {
    fn insert_client(&mut self, client: NewClient) -> Result<ClientProfile, RepositoryError> {
        if !self.users.iter().any(|c| c.user.id == client.user_id) {
            return Err(RepositoryError::MissingReference("usuario".to_owned()));
        }
        if self.clients.iter().any(|c| c.user_id == client.user_id) {
            return Err(RepositoryError::Conflict("usuario".to_owned()));
        }
        if client.document.is_some()
            && self.clients.iter().any(|c| c.document == client.document)
        {
            return Err(RepositoryError::Conflict("documento".to_owned()));
        }
        let now = Utc::now();
        let stored = ClientProfile {
            id: ClientId::new(self.next_id()),
            user_id: client.user_id,
            document: client.document,
            phone: client.phone,
            address: client.address,
            birth_date: client.birth_date,
            city: client.city,
            postal_code: client.postal_code,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.clients.push(stored.clone());
        Ok(stored)
    }

    fn with_owner(&self, client: &ClientProfile) -> Option<ClientWithUser> {
        let owner = self.users.iter().find(|c| c.user.id == client.user_id)?;
        Some(ClientWithUser {
            client: client.clone(),
            user: UserSummary::from(&owner.user),
        })
    }
}

impl ClientStore for MemoryStore {
    async fn list_clients(&self) -> Result<Vec<ClientWithUser>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .clients
            .iter()
            .filter_map(|c| tables.with_owner(c))
            .collect())
    }

    async fn find_client(&self, user_id: UserId) -> Result<Option<ClientProfile>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.clients.iter().find(|c| c.user_id == user_id).cloned())
    }

    async fn find_client_with_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<ClientWithUser>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .clients
            .iter()
            .find(|c| c.user_id == user_id)
            .and_then(|c| tables.with_owner(c)))
    }

    async fn create_client(&self, client: NewClient) -> Result<ClientProfile, RepositoryError> {
        self.tables.lock().unwrap().insert_client(client)
    }

    async fn update_client(
        &self,
        user_id: UserId,
        changes: ClientChanges,
    ) -> Result<Option<ClientProfile>, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if changes.document.is_some()
            && tables
                .clients
                .iter()
                .any(|c| c.document == changes.document && c.user_id != user_id)
        {
            return Err(RepositoryError::Conflict("documento".to_owned()));
        }
        let Some(client) = tables.clients.iter_mut().find(|c| c.user_id == user_id) else {
            return Ok(None);
        };
        if changes.document.is_some() {
            client.document = changes.document;
        }
        if let Some(v) = changes.phone {
            client.phone = v;
        }
        if let Some(v) = changes.address {
            client.address = v;
        }
        if let Some(v) = changes.birth_date {
            client.birth_date = v;
        }
        if let Some(v) = changes.city {
            client.city = v;
        }
        if let Some(v) = changes.postal_code {
            client.postal_code = v;
        }
        client.updated_at = Utc::now();
        Ok(Some(client.clone()))
    }

    async fn delete_client(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        let before = tables.clients.len();
        tables.clients.retain(|c| c.user_id != user_id);
        Ok(tables.clients.len() < before)
    }

    async fn record_purchase(
        &self,
        user_id: UserId,
        provision: Option<NewClient>,
        purchase: NewPurchase,
    ) -> Result<ClientProfile, RepositoryError> {
        let mut tables = self.tables.lock().unwrap();
        if let Some(client) = provision
            && !tables.clients.iter().any(|c| c.user_id == user_id)
        {
            tables.insert_client(client)?;
        }
        let id = PurchaseId::new(tables.next_id());
        let client = tables
            .clients
            .iter_mut()
            .find(|c| c.user_id == user_id)
            .ok_or(RepositoryError::NotFound)?;
        client.history.push(PurchaseEntry {
            id,
            product_id: Some(purchase.product_id),
            product_reference: purchase.product_reference,
            price_paid: purchase.price_paid,
            purchased_at: purchase.purchased_at,
        });
        client.updated_at = Utc::now();
        Ok(client.clone())
    }

    async fn resolved_profile(
        &self,
        user_id: UserId,
    ) -> Result<Option<ClientProfile<ResolvedPurchase>>, RepositoryError> {
        let tables = self.tables.lock().unwrap();
        let Some(client) = tables.clients.iter().find(|c| c.user_id == user_id) else {
            return Ok(None);
        };
        let history = client
            .history
            .iter()
            .map(|entry| ResolvedPurchase {
                entry: entry.clone(),
                product: entry
                    .product_id
                    .and_then(|id| tables.products.iter().find(|p| p.id == id).cloned()),
            })
            .collect();
        Ok(Some(with_history(client.clone(), history)))
    }
}

fn with_history<E, F>(client: ClientProfile<E>, history: Vec<F>) -> ClientProfile<F> {
    ClientProfile {
        id: client.id,
        user_id: client.user_id,
        document: client.document,
        phone: client.phone,
        address: client.address,
        birth_date: client.birth_date,
        city: client.city,
        postal_code: client.postal_code,
        history,
        created_at: client.created_at,
        updated_at: client.updated_at,
    }
}
