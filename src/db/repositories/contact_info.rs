//! Contact info repository
//!
//! The public contact card is the oldest active record; admins edit it in
//! place through `upsert`.

use crate::models::{ContactInfo, ContactInfoInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

#[async_trait]
pub trait ContactInfoRepository: Send + Sync {
    /// First active record, if any
    async fn get_active(&self) -> Result<Option<ContactInfo>>;

    /// Update the first record, or create it when the table is empty
    async fn upsert(&self, input: &ContactInfoInput) -> Result<ContactInfo>;
}

pub struct SqlxContactInfoRepository {
    pool: SqlitePool,
}

impl SqlxContactInfoRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: SqlitePool) -> Arc<dyn ContactInfoRepository> {
        Arc::new(Self::new(pool))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ContactInfo>> {
        let row = sqlx::query(&format!("SELECT {} FROM contact_info WHERE id = ?", COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to get contact info")?;
        Ok(row.as_ref().map(row_to_info))
    }
}

const COLUMNS: &str = "id, business_name, tagline, description, email, phone, address, website, \
    linkedin, twitter, facebook, instagram, github, business_hours, latitude, longitude, \
    is_active, created_at, updated_at";

#[async_trait]
impl ContactInfoRepository for SqlxContactInfoRepository {
    async fn get_active(&self) -> Result<Option<ContactInfo>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM contact_info WHERE is_active = 1 ORDER BY id ASC LIMIT 1",
            COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get active contact info")?;
        Ok(row.as_ref().map(row_to_info))
    }

    async fn upsert(&self, input: &ContactInfoInput) -> Result<ContactInfo> {
        let now = Utc::now();
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM contact_info ORDER BY id ASC LIMIT 1")
                .fetch_optional(&self.pool)
                .await
                .context("Failed to look up contact info")?;

        let id = match existing {
            Some(id) => {
                // Absent coordinates keep their stored value
                sqlx::query(
                    r#"
                    UPDATE contact_info
                    SET business_name = ?, tagline = ?, description = ?, email = ?, phone = ?,
                        address = ?, website = ?, linkedin = ?, twitter = ?, facebook = ?,
                        instagram = ?, github = ?, business_hours = ?,
                        latitude = CASE WHEN ? THEN ? ELSE latitude END,
                        longitude = CASE WHEN ? THEN ? ELSE longitude END,
                        is_active = ?, updated_at = ?
                    WHERE id = ?
                    "#,
                )
                .bind(&input.business_name)
                .bind(&input.tagline)
                .bind(&input.description)
                .bind(&input.email)
                .bind(&input.phone)
                .bind(&input.address)
                .bind(&input.website)
                .bind(&input.linkedin)
                .bind(&input.twitter)
                .bind(&input.facebook)
                .bind(&input.instagram)
                .bind(&input.github)
                .bind(&input.business_hours)
                .bind(input.latitude.is_some())
                .bind(input.latitude.flatten())
                .bind(input.longitude.is_some())
                .bind(input.longitude.flatten())
                .bind(input.is_active)
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await
                .context("Failed to update contact info")?;
                id
            }
            None => sqlx::query(
                r#"
                INSERT INTO contact_info (business_name, tagline, description, email, phone,
                    address, website, linkedin, twitter, facebook, instagram, github,
                    business_hours, latitude, longitude, is_active, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&input.business_name)
            .bind(&input.tagline)
            .bind(&input.description)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(&input.address)
            .bind(&input.website)
            .bind(&input.linkedin)
            .bind(&input.twitter)
            .bind(&input.facebook)
            .bind(&input.instagram)
            .bind(&input.github)
            .bind(&input.business_hours)
            .bind(input.latitude.flatten())
            .bind(input.longitude.flatten())
            .bind(input.is_active)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .context("Failed to create contact info")?
            .last_insert_rowid(),
        };

        self.get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Contact info not found after save"))
    }
}

fn row_to_info(row: &sqlx::sqlite::SqliteRow) -> ContactInfo {
    ContactInfo {
        id: row.get("id"),
        business_name: row.get("business_name"),
        tagline: row.get("tagline"),
        description: row.get("description"),
        email: row.get("email"),
        phone: row.get("phone"),
        address: row.get("address"),
        website: row.get("website"),
        linkedin: row.get("linkedin"),
        twitter: row.get("twitter"),
        facebook: row.get("facebook"),
        instagram: row.get("instagram"),
        github: row.get("github"),
        business_hours: row.get("business_hours"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}
