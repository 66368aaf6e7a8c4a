//! In-process user / merchant / product registry
//!
//! Read accessors for the order and reconciliation engines; registration
//! mints the ledger owner ids but does not touch balances (callers open
//! the accounts they need).

use crate::{
    error::{Error, Result},
    types::{Merchant, MerchantId, Product, User, UserId},
};
use chrono::Utc;
use dashmap::DashMap;
use ledger::{Currency, OwnerId, ProductId};
use rust_decimal::Decimal;

/// Registry of users, merchants and products
#[derive(Default)]
pub struct Catalog {
    users: DashMap<UserId, User>,
    merchants: DashMap<MerchantId, Merchant>,
    products: DashMap<ProductId, Product>,
    sku_index: DashMap<(MerchantId, String), ProductId>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user, minting the owner id of their prepaid balance
    pub fn register_user(&self, name: impl Into<String>, email: impl Into<String>) -> User {
        let user = User {
            id: UserId::generate(),
            name: name.into(),
            email: email.into(),
            account: OwnerId::generate(),
            created_at: Utc::now(),
        };
        self.users.insert(user.id, user.clone());
        tracing::info!(user = %user.id, account = %user.account, "User registered");
        user
    }

    /// Register a merchant, minting the owner id of their settlement balance
    pub fn register_merchant(&self, name: impl Into<String>) -> Merchant {
        let merchant = Merchant {
            id: MerchantId::generate(),
            name: name.into(),
            account: OwnerId::generate(),
            created_at: Utc::now(),
        };
        self.merchants.insert(merchant.id, merchant.clone());
        tracing::info!(merchant = %merchant.id, account = %merchant.account, "Merchant registered");
        merchant
    }

    /// Register a product; (merchant, sku) must be unique
    pub fn register_product(
        &self,
        merchant: MerchantId,
        sku: impl Into<String>,
        name: impl Into<String>,
        price: Decimal,
        currency: Currency,
    ) -> Result<Product> {
        if !self.merchants.contains_key(&merchant) {
            return Err(Error::not_found("Merchant", merchant));
        }

        let sku = sku.into();
        let product = Product {
            id: ProductId::generate(),
            merchant,
            sku: sku.clone(),
            name: name.into(),
            price,
            currency,
            created_at: Utc::now(),
        };

        match self.sku_index.entry((merchant, sku.clone())) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(Error::DuplicateSku {
                merchant: merchant.to_string(),
                sku,
            }),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(product.id);
                self.products.insert(product.id, product.clone());
                tracing::info!(product = %product.id, %merchant, sku, "Product registered");
                Ok(product)
            }
        }
    }

    /// Look up a user by id
    pub fn user(&self, id: UserId) -> Result<User> {
        self.users
            .get(&id)
            .map(|u| u.clone())
            .ok_or_else(|| Error::not_found("User", id))
    }

    /// Look up a merchant by id
    pub fn merchant(&self, id: MerchantId) -> Result<Merchant> {
        self.merchants
            .get(&id)
            .map(|m| m.clone())
            .ok_or_else(|| Error::not_found("Merchant", id))
    }

    /// Look up a product by id
    pub fn product(&self, id: ProductId) -> Result<Product> {
        self.products
            .get(&id)
            .map(|p| p.clone())
            .ok_or_else(|| Error::not_found("Product", id))
    }

    /// Look up a product by (merchant, sku)
    pub fn product_by_sku(&self, merchant: MerchantId, sku: &str) -> Result<Product> {
        let id = self
            .sku_index
            .get(&(merchant, sku.to_string()))
            .map(|entry| *entry)
            .ok_or_else(|| Error::not_found("Product", format!("{merchant}/{sku}")))?;
        self.product(id)
    }

    /// All registered merchants (for the reconciliation batch)
    pub fn merchants(&self) -> Vec<Merchant> {
        self.merchants.iter().map(|m| m.clone()).collect()
    }

    /// All products of a merchant
    pub fn products_for_merchant(&self, merchant: MerchantId) -> Vec<Product> {
        self.products
            .iter()
            .filter(|p| p.merchant == merchant)
            .map(|p| p.clone())
            .collect()
    }
}
