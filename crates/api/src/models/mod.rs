//! Domain models and request payloads.
//!
//! Wire names follow the public API (`nombreCompleto`, `correo`, ...);
//! Rust field names stay in English.

pub mod client;
pub mod product;
pub mod user;

pub use client::{
    ClientChanges, ClientInput, ClientProfile, ClientWithUser, NewClient, NewPurchase,
    ProfileView, PurchaseEntry, ResolvedPurchase,
};
pub use product::{NewProduct, Product, ProductChanges, ProductFilter, ProductInput, ProductQuery};
pub use user::{NewUser, Registration, User, UserChanges, UserCredentials, UserInput, UserSummary};
