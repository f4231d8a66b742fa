//! Per-table CRUD access.
//!
//! [`Record`] describes how a model type maps onto its table;
//! [`Repository`] turns that description into prepared single-row
//! statements. Targeted updates live in `impl Repository<'_, T>` blocks for
//! the one record type they apply to.

use std::marker::PhantomData;

use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use tracing::debug;

use crate::error::Result;
use crate::model::{Claim, ClaimStatus, FoodListing, Provider, Receiver};

/// A model type stored one-per-row in a table.
pub trait Record: Sized {
    /// Singular noun used in log lines and errors.
    const ENTITY: &'static str;
    /// Table name.
    const TABLE: &'static str;
    /// Primary key column. Must be the first entry of `COLUMNS`.
    const KEY: &'static str;
    /// Every column, in declaration order.
    const COLUMNS: &'static [&'static str];

    /// The primary key value.
    fn id(&self) -> i64;

    /// Read a record from a row selected with `COLUMNS` in order.
    ///
    /// # Errors
    ///
    /// Returns an error if a column cannot be converted.
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self>;

    /// Parameter values for `COLUMNS`, in order.
    fn values(&self) -> Vec<&dyn ToSql>;
}

impl Record for Provider {
    const ENTITY: &'static str = "provider";
    const TABLE: &'static str = "providers";
    const KEY: &'static str = "provider_id";
    const COLUMNS: &'static [&'static str] =
        &["provider_id", "name", "type", "address", "city", "contact"];

    fn id(&self) -> i64 {
        self.provider_id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            provider_id: row.get(0)?,
            name: row.get(1)?,
            provider_type: row.get(2)?,
            address: row.get(3)?,
            city: row.get(4)?,
            contact: row.get(5)?,
        })
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        params![
            self.provider_id,
            self.name,
            self.provider_type,
            self.address,
            self.city,
            self.contact,
        ]
        .to_vec()
    }
}

impl Record for Receiver {
    const ENTITY: &'static str = "receiver";
    const TABLE: &'static str = "receivers";
    const KEY: &'static str = "receiver_id";
    const COLUMNS: &'static [&'static str] = &["receiver_id", "name", "type", "city", "contact"];

    fn id(&self) -> i64 {
        self.receiver_id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            receiver_id: row.get(0)?,
            name: row.get(1)?,
            receiver_type: row.get(2)?,
            city: row.get(3)?,
            contact: row.get(4)?,
        })
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        params![
            self.receiver_id,
            self.name,
            self.receiver_type,
            self.city,
            self.contact,
        ]
        .to_vec()
    }
}

impl Record for FoodListing {
    const ENTITY: &'static str = "food listing";
    const TABLE: &'static str = "food_listings";
    const KEY: &'static str = "food_id";
    const COLUMNS: &'static [&'static str] = &[
        "food_id",
        "food_name",
        "quantity",
        "expiry_date",
        "provider_id",
        "provider_type",
        "location",
        "food_type",
        "meal_type",
    ];

    fn id(&self) -> i64 {
        self.food_id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            food_id: row.get(0)?,
            food_name: row.get(1)?,
            quantity: row.get(2)?,
            expiry_date: row.get(3)?,
            provider_id: row.get(4)?,
            provider_type: row.get(5)?,
            location: row.get(6)?,
            food_type: row.get(7)?,
            meal_type: row.get(8)?,
        })
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        params![
            self.food_id,
            self.food_name,
            self.quantity,
            self.expiry_date,
            self.provider_id,
            self.provider_type,
            self.location,
            self.food_type,
            self.meal_type,
        ]
        .to_vec()
    }
}

impl Record for Claim {
    const ENTITY: &'static str = "claim";
    const TABLE: &'static str = "claims";
    const KEY: &'static str = "claim_id";
    const COLUMNS: &'static [&'static str] =
        &["claim_id", "food_id", "receiver_id", "status", "timestamp"];

    fn id(&self) -> i64 {
        self.claim_id
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            claim_id: row.get(0)?,
            food_id: row.get(1)?,
            receiver_id: row.get(2)?,
            status: row.get(3)?,
            timestamp: row.get(4)?,
        })
    }

    fn values(&self) -> Vec<&dyn ToSql> {
        params![
            self.claim_id,
            self.food_id,
            self.receiver_id,
            self.status,
            self.timestamp,
        ]
        .to_vec()
    }
}

/// Single-row statements against the table of `R`.
#[derive(Debug)]
pub struct Repository<'c, R> {
    conn: &'c Connection,
    record: PhantomData<fn() -> R>,
}

impl<'c, R: Record> Repository<'c, R> {
    /// Create a repository over a borrowed connection.
    #[must_use]
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            record: PhantomData,
        }
    }

    fn select_sql() -> String {
        format!("SELECT {} FROM {}", R::COLUMNS.join(", "), R::TABLE)
    }

    fn insert_sql() -> String {
        let placeholders: Vec<String> = (1..=R::COLUMNS.len()).map(|i| format!("?{i}")).collect();
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            R::TABLE,
            R::COLUMNS.join(", "),
            placeholders.join(", ")
        )
    }

    fn upsert_sql() -> String {
        let assignments: Vec<String> = R::COLUMNS
            .iter()
            .filter(|column| **column != R::KEY)
            .map(|column| format!("{column} = excluded.{column}"))
            .collect();
        format!(
            "{} ON CONFLICT ({}) DO UPDATE SET {}",
            Self::insert_sql(),
            R::KEY,
            assignments.join(", ")
        )
    }

    /// Insert a new row.
    ///
    /// # Errors
    ///
    /// Fails with a constraint violation if the key is taken or a
    /// referenced row does not exist.
    pub fn insert(&self, record: &R) -> Result<()> {
        self.conn
            .execute(&Self::insert_sql(), record.values().as_slice())?;
        debug!("Inserted {} {}", R::ENTITY, record.id());
        Ok(())
    }

    /// Insert a row, or overwrite every column of the row with the same key.
    ///
    /// # Errors
    ///
    /// Fails with a constraint violation if a referenced row does not exist.
    pub fn save(&self, record: &R) -> Result<()> {
        self.conn
            .execute(&Self::upsert_sql(), record.values().as_slice())?;
        debug!("Saved {} {}", R::ENTITY, record.id());
        Ok(())
    }

    /// Get a row by primary key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn get(&self, id: i64) -> Result<Option<R>> {
        let sql = format!("{} WHERE {} = ?1", Self::select_sql(), R::KEY);
        let record = self.conn.query_row(&sql, [id], R::from_row).optional()?;
        Ok(record)
    }

    /// Every row, ordered by primary key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list(&self) -> Result<Vec<R>> {
        let sql = format!("{} ORDER BY {}", Self::select_sql(), R::KEY);
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([], R::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Number of rows in the table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn count(&self) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", R::TABLE),
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a row by primary key.
    ///
    /// Returns `true` if a row was deleted, `false` if not found.
    ///
    /// # Errors
    ///
    /// Fails with a foreign-key violation when other rows still reference
    /// this one and the schema does not cascade.
    pub fn delete(&self, id: i64) -> Result<bool> {
        let affected = self.conn.execute(
            &format!("DELETE FROM {} WHERE {} = ?1", R::TABLE, R::KEY),
            [id],
        )?;
        if affected > 0 {
            debug!("Deleted {} {}", R::ENTITY, id);
        }
        Ok(affected > 0)
    }

    /// Set one column of the row with the given key.
    fn update_column(&self, id: i64, column: &'static str, value: &dyn ToSql) -> Result<bool> {
        debug_assert!(R::COLUMNS.contains(&column));
        let affected = self.conn.execute(
            &format!("UPDATE {} SET {column} = ?1 WHERE {} = ?2", R::TABLE, R::KEY),
            params![value, id],
        )?;
        if affected > 0 {
            debug!("Updated {} {} ({})", R::ENTITY, id, column);
        }
        Ok(affected > 0)
    }
}

impl Repository<'_, Provider> {
    /// Move a provider to another city.
    ///
    /// Returns `false` if no provider has this id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_city(&self, id: i64, city: &str) -> Result<bool> {
        self.update_column(id, "city", &city)
    }

    /// Providers in a city, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_by_city(&self, city: &str) -> Result<Vec<Provider>> {
        let sql = format!("{} WHERE city = ?1 ORDER BY name, provider_id", Self::select_sql());
        let mut stmt = self.conn.prepare(&sql)?;
        let providers = stmt
            .query_map([city], Provider::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(providers)
    }
}

impl Repository<'_, Receiver> {
    /// Move a receiver to another city.
    ///
    /// Returns `false` if no receiver has this id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_city(&self, id: i64, city: &str) -> Result<bool> {
        self.update_column(id, "city", &city)
    }
}

impl Repository<'_, FoodListing> {
    /// Change the quantity on offer.
    ///
    /// Returns `false` if no listing has this id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_quantity(&self, id: i64, quantity: u32) -> Result<bool> {
        self.update_column(id, "quantity", &quantity)
    }
}

impl Repository<'_, Claim> {
    /// Move a claim to another status.
    ///
    /// Returns `false` if no claim has this id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn update_status(&self, id: i64, status: ClaimStatus) -> Result<bool> {
        self.update_column(id, "status", &status)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::storage::{DeletePolicy, Storage};
    use crate::testing::{listing, provider, seeded_storage};

    #[test]
    fn test_insert_and_get_returns_inserted_attributes() {
        let storage = Storage::open_in_memory(DeletePolicy::Cascade).unwrap();
        let providers = storage.providers();

        let inserted = provider(10, "Harbor Deli", "Portland");
        providers.insert(&inserted).unwrap();

        assert_eq!(providers.get(10).unwrap(), Some(inserted));
    }

    #[test]
    fn test_insert_keeps_null_attributes() {
        let storage = Storage::open_in_memory(DeletePolicy::Cascade).unwrap();
        let inserted = Provider {
            provider_id: 11,
            name: "Anonymous".to_string(),
            provider_type: None,
            address: None,
            city: None,
            contact: None,
        };
        storage.providers().insert(&inserted).unwrap();

        assert_eq!(storage.providers().get(11).unwrap(), Some(inserted));
    }

    #[test]
    fn test_get_nonexistent() {
        let storage = seeded_storage(DeletePolicy::Cascade);
        assert!(storage.claims().get(99_999).unwrap().is_none());
    }

    #[test]
    fn test_insert_duplicate_key_is_constraint_violation() {
        let storage = seeded_storage(DeletePolicy::Cascade);

        let err = storage
            .providers()
            .insert(&provider(1, "Duplicate", "Springfield"))
            .unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_insert_dangling_reference_is_constraint_violation() {
        let storage = seeded_storage(DeletePolicy::Restrict);

        let err = storage
            .listings()
            .insert(&listing(50, 999, 5, NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()))
            .unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(storage.listings().get(50).unwrap().is_none());
    }

    #[test]
    fn test_invalid_status_text_rejected_by_schema() {
        let storage = seeded_storage(DeletePolicy::Cascade);
        let result = storage.connection().execute(
            "INSERT INTO claims VALUES (90, 1, 1, 'Lost', '2025-03-01 00:00:00')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_save_inserts_then_updates() {
        let storage = seeded_storage(DeletePolicy::Cascade);
        let providers = storage.providers();

        let mut saved = provider(20, "Night Market", "Springfield");
        providers.save(&saved).unwrap();
        assert_eq!(providers.get(20).unwrap().as_ref(), Some(&saved));

        saved.name = "Night Market Co-op".to_string();
        saved.contact = None;
        providers.save(&saved).unwrap();
        assert_eq!(providers.get(20).unwrap(), Some(saved));
        assert_eq!(providers.count().unwrap(), 5);
    }

    #[test]
    fn test_update_city_changes_only_city() {
        let storage = seeded_storage(DeletePolicy::Cascade);
        let providers = storage.providers();
        let before = providers.get(1).unwrap().unwrap();

        assert!(providers.update_city(1, "Capital City").unwrap());

        let after = providers.get(1).unwrap().unwrap();
        assert_eq!(after.city.as_deref(), Some("Capital City"));
        assert_eq!(
            Provider {
                city: before.city.clone(),
                ..after
            },
            before
        );
    }

    #[test]
    fn test_update_missing_row_returns_false() {
        let storage = seeded_storage(DeletePolicy::Cascade);
        assert!(!storage.providers().update_city(999, "Nowhere").unwrap());
        assert!(!storage.receivers().update_city(999, "Nowhere").unwrap());
        assert!(!storage.listings().update_quantity(999, 1).unwrap());
        assert!(!storage.claims().update_status(999, ClaimStatus::Pending).unwrap());
    }

    #[test]
    fn test_update_quantity_and_status() {
        let storage = seeded_storage(DeletePolicy::Cascade);

        assert!(storage.listings().update_quantity(1, 0).unwrap());
        assert_eq!(storage.listings().get(1).unwrap().unwrap().quantity, 0);

        assert!(storage
            .claims()
            .update_status(2, ClaimStatus::Cancelled)
            .unwrap());
        assert_eq!(
            storage.claims().get(2).unwrap().unwrap().status,
            ClaimStatus::Cancelled
        );
    }

    #[test]
    fn test_update_receiver_city() {
        let storage = seeded_storage(DeletePolicy::Cascade);
        assert!(storage.receivers().update_city(3, "Shelbyville").unwrap());
        assert_eq!(
            storage.receivers().get(3).unwrap().unwrap().city.as_deref(),
            Some("Shelbyville")
        );
    }

    #[test]
    fn test_list_is_ordered_by_key() {
        let storage = seeded_storage(DeletePolicy::Cascade);
        let ids: Vec<i64> = storage
            .claims()
            .list()
            .unwrap()
            .iter()
            .map(|claim| claim.claim_id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_list_by_city() {
        let storage = seeded_storage(DeletePolicy::Cascade);
        let names: Vec<String> = storage
            .providers()
            .list_by_city("Springfield")
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Fresh Mart", "Gonzales Bakery"]);
    }

    #[test]
    fn test_delete_referenced_provider_cascades() {
        let storage = seeded_storage(DeletePolicy::Cascade);

        // Provider 3 owns listings 3 and 4, which carry claims 3, 4 and 5
        assert!(storage.providers().delete(3).unwrap());

        assert!(storage.listings().get(3).unwrap().is_none());
        assert!(storage.listings().get(4).unwrap().is_none());
        assert_eq!(storage.listings().count().unwrap(), 3);
        assert_eq!(storage.claims().count().unwrap(), 2);
    }

    #[test]
    fn test_delete_referenced_provider_restricted() {
        let storage = seeded_storage(DeletePolicy::Restrict);

        let err = storage.providers().delete(3).unwrap_err();
        assert!(err.is_constraint_violation());
        assert!(storage.providers().get(3).unwrap().is_some());
        assert_eq!(storage.listings().count().unwrap(), 5);
    }

    #[test]
    fn test_delete_unreferenced_rows() {
        let storage = seeded_storage(DeletePolicy::Restrict);

        // Provider 4 has no listings, receiver 3 has no claims
        assert!(storage.providers().delete(4).unwrap());
        assert!(storage.receivers().delete(3).unwrap());
        assert!(storage.claims().delete(1).unwrap());
        assert!(!storage.claims().delete(1).unwrap());
    }

    #[test]
    fn test_delete_listing_cascades_to_claims() {
        let storage = seeded_storage(DeletePolicy::Cascade);

        assert!(storage.listings().delete(1).unwrap());
        assert!(storage.claims().get(1).unwrap().is_none());
        assert!(storage.claims().get(2).unwrap().is_none());
        assert_eq!(storage.claims().count().unwrap(), 3);
    }

    #[test]
    fn test_generated_sql() {
        assert_eq!(
            Repository::<'_, Receiver>::insert_sql(),
            "INSERT INTO receivers (receiver_id, name, type, city, contact) VALUES (?1, ?2, ?3, ?4, ?5)"
        );
        let upsert = Repository::<'_, Claim>::upsert_sql();
        assert!(upsert.contains("ON CONFLICT (claim_id) DO UPDATE SET"));
        assert!(upsert.contains("status = excluded.status"));
        assert!(!upsert.contains("claim_id = excluded.claim_id"));
    }
}
