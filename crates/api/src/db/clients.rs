//! `ClientStore` over `PostgreSQL`.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;

use tienda_core::{ClientId, Email, Phone, Price, ProductId, PurchaseId, Role, UserId};

use super::{ClientStore, PgStore, RepositoryError, map_write_error};
use crate::models::{
    ClientChanges, ClientProfile, ClientWithUser, NewClient, NewPurchase, Product, PurchaseEntry,
    ResolvedPurchase, UserSummary,
};

const CLIENT_COLUMNS: &str = "c.id, c.user_id, c.document, c.phone, c.address, c.birth_date, \
                              c.city, c.postal_code, c.created_at, c.updated_at";

const PURCHASE_COLUMNS: &str =
    "h.id, h.client_id, h.product_id, h.product_reference, h.price_paid, h.purchased_at";

#[derive(sqlx::FromRow)]
struct ClientRow {
    id: ClientId,
    user_id: UserId,
    document: Option<String>,
    phone: String,
    address: String,
    birth_date: NaiveDate,
    city: String,
    postal_code: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct ClientOwnerRow {
    #[sqlx(flatten)]
    client: ClientRow,
    owner_name: String,
    owner_email: String,
    owner_role: String,
}

#[derive(sqlx::FromRow)]
struct PurchaseRow {
    id: PurchaseId,
    client_id: ClientId,
    product_id: Option<ProductId>,
    product_reference: String,
    price_paid: Price,
    purchased_at: DateTime<Utc>,
}

/// A history row left-joined to the catalog; `p_*` are null once the
/// product is gone.
#[derive(sqlx::FromRow)]
struct ResolvedRow {
    #[sqlx(flatten)]
    purchase: PurchaseRow,
    p_id: Option<ProductId>,
    p_reference: Option<String>,
    p_name: Option<String>,
    p_description: Option<String>,
    p_price: Option<Price>,
    p_published: Option<bool>,
    p_image_url: Option<String>,
    p_created_at: Option<DateTime<Utc>>,
    p_updated_at: Option<DateTime<Utc>>,
}

impl From<PurchaseRow> for PurchaseEntry {
    fn from(row: PurchaseRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            product_reference: row.product_reference,
            price_paid: row.price_paid,
            purchased_at: row.purchased_at,
        }
    }
}

impl From<ResolvedRow> for ResolvedPurchase {
    fn from(row: ResolvedRow) -> Self {
        let product = match (
            row.p_id,
            row.p_reference,
            row.p_name,
            row.p_price,
            row.p_published,
            row.p_created_at,
            row.p_updated_at,
        ) {
            (
                Some(id),
                Some(reference),
                Some(name),
                Some(price),
                Some(published),
                Some(created_at),
                Some(updated_at),
            ) => Some(Product {
                id,
                reference,
                name,
                description: row.p_description,
                price,
                published,
                image_url: row.p_image_url,
                created_at,
                updated_at,
            }),
            _ => None,
        };

        Self {
            entry: row.purchase.into(),
            product,
        }
    }
}

impl ClientRow {
    fn into_profile<E>(self, history: Vec<E>) -> Result<ClientProfile<E>, RepositoryError> {
        let phone = Phone::parse(&self.phone).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid phone in database: {e}"))
        })?;

        Ok(ClientProfile {
            id: self.id,
            user_id: self.user_id,
            document: self.document,
            phone,
            address: self.address,
            birth_date: self.birth_date,
            city: self.city,
            postal_code: self.postal_code,
            history,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl ClientOwnerRow {
    fn into_client_with_user(
        self,
        history: Vec<PurchaseEntry>,
    ) -> Result<ClientWithUser, RepositoryError> {
        let email = Email::parse(&self.owner_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = self.owner_role.parse::<Role>().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid role in database: {e}"))
        })?;

        Ok(ClientWithUser {
            client: self.client.into_profile(history)?,
            user: UserSummary {
                full_name: self.owner_name,
                email,
                role,
            },
        })
    }
}

async fn fetch_client(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Option<ClientRow>, sqlx::Error> {
    sqlx::query_as::<_, ClientRow>(&format!(
        "SELECT {CLIENT_COLUMNS} FROM tienda.clients c WHERE c.user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

async fn fetch_history(
    conn: &mut PgConnection,
    client_id: ClientId,
) -> Result<Vec<PurchaseEntry>, sqlx::Error> {
    let rows = sqlx::query_as::<_, PurchaseRow>(&format!(
        r"
        SELECT {PURCHASE_COLUMNS} FROM tienda.purchases h
        WHERE h.client_id = $1
        ORDER BY h.purchased_at, h.id
        "
    ))
    .bind(client_id)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(PurchaseEntry::from).collect())
}

impl PgStore {
    async fn load_client(&self, user_id: UserId) -> Result<Option<ClientProfile>, RepositoryError> {
        let mut conn = self.pool().acquire().await?;
        let Some(row) = fetch_client(&mut conn, user_id).await? else {
            return Ok(None);
        };
        let history = fetch_history(&mut conn, row.id).await?;
        row.into_profile(history).map(Some)
    }
}

impl ClientStore for PgStore {
    async fn list_clients(&self) -> Result<Vec<ClientWithUser>, RepositoryError> {
        let rows = sqlx::query_as::<_, ClientOwnerRow>(&format!(
            r"
            SELECT {CLIENT_COLUMNS},
                   u.full_name AS owner_name, u.email AS owner_email, u.role AS owner_role
            FROM tienda.clients c
            JOIN tienda.users u ON u.id = c.user_id
            ORDER BY c.id
            "
        ))
        .fetch_all(self.pool())
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.client.id.as_i32()).collect();
        let purchases = sqlx::query_as::<_, PurchaseRow>(&format!(
            r"
            SELECT {PURCHASE_COLUMNS} FROM tienda.purchases h
            WHERE h.client_id = ANY($1)
            ORDER BY h.purchased_at, h.id
            "
        ))
        .bind(ids.as_slice())
        .fetch_all(self.pool())
        .await?;

        let mut histories: HashMap<ClientId, Vec<PurchaseEntry>> = HashMap::new();
        for purchase in purchases {
            histories
                .entry(purchase.client_id)
                .or_default()
                .push(purchase.into());
        }

        rows.into_iter()
            .map(|row| {
                let history = histories.remove(&row.client.id).unwrap_or_default();
                row.into_client_with_user(history)
            })
            .collect()
    }

    async fn find_client(&self, user_id: UserId) -> Result<Option<ClientProfile>, RepositoryError> {
        self.load_client(user_id).await
    }

    async fn find_client_with_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<ClientWithUser>, RepositoryError> {
        let mut conn = self.pool().acquire().await?;
        let row = sqlx::query_as::<_, ClientOwnerRow>(&format!(
            r"
            SELECT {CLIENT_COLUMNS},
                   u.full_name AS owner_name, u.email AS owner_email, u.role AS owner_role
            FROM tienda.clients c
            JOIN tienda.users u ON u.id = c.user_id
            WHERE c.user_id = $1
            "
        ))
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let history = fetch_history(&mut conn, row.client.id).await?;
        row.into_client_with_user(history).map(Some)
    }

    async fn create_client(&self, client: NewClient) -> Result<ClientProfile, RepositoryError> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            r"
            INSERT INTO tienda.clients AS c
                (user_id, document, phone, address, birth_date, city, postal_code)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CLIENT_COLUMNS}
            "
        ))
        .bind(client.user_id)
        .bind(&client.document)
        .bind(client.phone.as_str())
        .bind(&client.address)
        .bind(client.birth_date)
        .bind(&client.city)
        .bind(&client.postal_code)
        .fetch_one(self.pool())
        .await
        .map_err(map_write_error)?;

        row.into_profile(Vec::new())
    }

    async fn update_client(
        &self,
        user_id: UserId,
        changes: ClientChanges,
    ) -> Result<Option<ClientProfile>, RepositoryError> {
        let mut conn = self.pool().acquire().await?;
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            r"
            UPDATE tienda.clients AS c
            SET document = COALESCE($2, c.document),
                phone = COALESCE($3, c.phone),
                address = COALESCE($4, c.address),
                birth_date = COALESCE($5, c.birth_date),
                city = COALESCE($6, c.city),
                postal_code = COALESCE($7, c.postal_code)
            WHERE c.user_id = $1
            RETURNING {CLIENT_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(changes.document)
        .bind(changes.phone.as_ref().map(Phone::as_str))
        .bind(changes.address)
        .bind(changes.birth_date)
        .bind(changes.city)
        .bind(changes.postal_code)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_write_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let history = fetch_history(&mut conn, row.id).await?;
        row.into_profile(history).map(Some)
    }

    async fn delete_client(&self, user_id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM tienda.clients WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_purchase(
        &self,
        user_id: UserId,
        provision: Option<NewClient>,
        purchase: NewPurchase,
    ) -> Result<ClientProfile, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        if let Some(client) = provision {
            sqlx::query(
                r"
                INSERT INTO tienda.clients
                    (user_id, document, phone, address, birth_date, city, postal_code)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ON CONFLICT (user_id) DO NOTHING
                ",
            )
            .bind(client.user_id)
            .bind(&client.document)
            .bind(client.phone.as_str())
            .bind(&client.address)
            .bind(client.birth_date)
            .bind(&client.city)
            .bind(&client.postal_code)
            .execute(&mut *tx)
            .await
            .map_err(map_write_error)?;
        }

        // Row lock serializes appends from concurrent purchases.
        let client_id = sqlx::query_scalar::<_, ClientId>(
            "SELECT id FROM tienda.clients WHERE user_id = $1 FOR UPDATE",
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        sqlx::query(
            r"
            INSERT INTO tienda.purchases
                (client_id, product_id, product_reference, price_paid, purchased_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(client_id)
        .bind(purchase.product_id)
        .bind(&purchase.product_reference)
        .bind(purchase.price_paid)
        .bind(purchase.purchased_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let row = fetch_client(&mut tx, user_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        let history = fetch_history(&mut tx, client_id).await?;
        tx.commit().await?;

        row.into_profile(history)
    }

    async fn resolved_profile(
        &self,
        user_id: UserId,
    ) -> Result<Option<ClientProfile<ResolvedPurchase>>, RepositoryError> {
        let mut conn = self.pool().acquire().await?;
        let Some(row) = fetch_client(&mut conn, user_id).await? else {
            return Ok(None);
        };

        let history = sqlx::query_as::<_, ResolvedRow>(&format!(
            r"
            SELECT {PURCHASE_COLUMNS},
                   p.id AS p_id, p.reference AS p_reference, p.name AS p_name,
                   p.description AS p_description, p.price AS p_price,
                   p.published AS p_published, p.image_url AS p_image_url,
                   p.created_at AS p_created_at, p.updated_at AS p_updated_at
            FROM tienda.purchases h
            LEFT JOIN tienda.products p ON p.id = h.product_id
            WHERE h.client_id = $1
            ORDER BY h.purchased_at, h.id
            "
        ))
        .bind(row.id)
        .fetch_all(&mut *conn)
        .await?;

        row.into_profile(history.into_iter().map(ResolvedPurchase::from).collect())
            .map(Some)
    }
}
