//! SQLite-backed listing store
//!
//! Translates the predicate tree into SQL with `sqlx::QueryBuilder`. Free-text
//! matching runs plain `instr` substring checks against shadow columns that
//! are lowercased in Rust at insert time. SQLite's own `lower()` folds ASCII
//! only, so folding on the Rust side keeps case-insensitivity consistent with
//! the in-memory interpreter for non-ASCII text.

use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use uuid::Uuid;

use super::{FacetRows, ListingStore, Predicate, SortField, SortSpec, TextField};
use crate::models::{Category, Condition, Listing, ListingStatus, SortOrder};

pub struct SqliteListingStore {
    pool: SqlitePool,
}

impl SqliteListingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Create tables and indexes if they do not exist yet.
    pub async fn init_db(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS listings (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                brand TEXT,
                model TEXT,
                category_id TEXT NOT NULL,
                condition TEXT NOT NULL,
                price REAL NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                latitude REAL,
                longitude REAL,
                negotiable INTEGER NOT NULL DEFAULT 0,
                pickup_available INTEGER NOT NULL DEFAULT 0,
                shipping_available INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 1,
                views INTEGER NOT NULL DEFAULT 0,
                saves INTEGER NOT NULL DEFAULT 0,
                seller_id TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                title_lc TEXT NOT NULL,
                description_lc TEXT NOT NULL,
                brand_model_lc TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                name_lc TEXT NOT NULL,
                parent_id TEXT
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_status ON listings(status, is_active)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_category ON listings(category_id)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_price ON listings(price)")
            .execute(&self.pool)
            .await?;
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_listings_created ON listings(created_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn insert_listing(&self, listing: &Listing) -> Result<()> {
        let brand_model = format!(
            "{} {}",
            listing.brand.as_deref().unwrap_or(""),
            listing.model.as_deref().unwrap_or("")
        );
        sqlx::query(
            "INSERT INTO listings (
                id, title, description, brand, model, category_id, condition,
                price, city, state, latitude, longitude, negotiable,
                pickup_available, shipping_available, status, is_active,
                views, saves, seller_id, created_at, updated_at,
                title_lc, description_lc, brand_model_lc
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(listing.id.to_string())
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(&listing.brand)
        .bind(&listing.model)
        .bind(listing.category_id.to_string())
        .bind(listing.condition.as_str())
        .bind(listing.price)
        .bind(&listing.city)
        .bind(&listing.state)
        .bind(listing.latitude)
        .bind(listing.longitude)
        .bind(listing.negotiable)
        .bind(listing.pickup_available)
        .bind(listing.shipping_available)
        .bind(listing.status.as_str())
        .bind(listing.is_active)
        .bind(listing.views)
        .bind(listing.saves)
        .bind(listing.seller_id.to_string())
        .bind(listing.created_at.timestamp_millis())
        .bind(listing.updated_at.timestamp_millis())
        .bind(listing.title.to_lowercase())
        .bind(listing.description.to_lowercase())
        .bind(brand_model.to_lowercase())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_category(&self, category: &Category) -> Result<()> {
        sqlx::query("INSERT INTO categories (id, name, name_lc, parent_id) VALUES (?, ?, ?, ?)")
            .bind(category.id.to_string())
            .bind(&category.name)
            .bind(category.name.to_lowercase())
            .bind(category.parent_id.map(|id| id.to_string()))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    fn sort_column(field: SortField) -> &'static str {
        match field {
            SortField::Price => "price",
            SortField::CreatedAt => "created_at",
            SortField::Views => "views",
            SortField::Saves => "saves",
        }
    }

    fn push_predicate(qb: &mut QueryBuilder<'_, Sqlite>, predicate: &Predicate) {
        match predicate {
            Predicate::All(children) => {
                if children.is_empty() {
                    qb.push("1");
                    return;
                }
                qb.push("(");
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        qb.push(" AND ");
                    }
                    Self::push_predicate(qb, child);
                }
                qb.push(")");
            }
            Predicate::Any(children) => {
                if children.is_empty() {
                    qb.push("0");
                    return;
                }
                qb.push("(");
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        qb.push(" OR ");
                    }
                    Self::push_predicate(qb, child);
                }
                qb.push(")");
            }
            Predicate::ActiveEq(v) => {
                qb.push("is_active = ").push_bind(*v);
            }
            Predicate::StatusEq(s) => {
                qb.push("status = ").push_bind(s.as_str());
            }
            Predicate::CategoryIn(ids) => {
                if ids.is_empty() {
                    qb.push("0");
                    return;
                }
                qb.push("category_id IN (");
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        qb.push(", ");
                    }
                    qb.push_bind(id.to_string());
                }
                qb.push(")");
            }
            Predicate::SellerEq(id) => {
                qb.push("seller_id = ").push_bind(id.to_string());
            }
            Predicate::ConditionIn(conditions) => {
                if conditions.is_empty() {
                    qb.push("0");
                    return;
                }
                qb.push("condition IN (");
                for (i, c) in conditions.iter().enumerate() {
                    if i > 0 {
                        qb.push(", ");
                    }
                    qb.push_bind(c.as_str());
                }
                qb.push(")");
            }
            Predicate::PriceGte(v) => {
                qb.push("price >= ").push_bind(*v);
            }
            Predicate::PriceLte(v) => {
                qb.push("price <= ").push_bind(*v);
            }
            Predicate::CreatedGte(t) => {
                qb.push("created_at >= ").push_bind(t.timestamp_millis());
            }
            Predicate::CreatedLte(t) => {
                qb.push("created_at <= ").push_bind(t.timestamp_millis());
            }
            Predicate::CityEq(city) => {
                qb.push("lower(city) = ").push_bind(city.to_lowercase());
            }
            Predicate::StateEq(state) => {
                qb.push("lower(state) = ").push_bind(state.to_lowercase());
            }
            Predicate::GeoBox {
                min_lat,
                max_lat,
                min_lon,
                max_lon,
            } => {
                qb.push("(latitude IS NOT NULL AND longitude IS NOT NULL AND latitude >= ")
                    .push_bind(*min_lat);
                qb.push(" AND latitude <= ").push_bind(*max_lat);
                qb.push(" AND longitude >= ").push_bind(*min_lon);
                qb.push(" AND longitude <= ").push_bind(*max_lon);
                qb.push(")");
            }
            Predicate::NegotiableEq(v) => {
                qb.push("negotiable = ").push_bind(*v);
            }
            Predicate::PickupEq(v) => {
                qb.push("pickup_available = ").push_bind(*v);
            }
            Predicate::ShippingEq(v) => {
                qb.push("shipping_available = ").push_bind(*v);
            }
            Predicate::TextAll { field, terms } => {
                if terms.is_empty() {
                    qb.push("1");
                    return;
                }
                qb.push("(");
                for (i, term) in terms.iter().enumerate() {
                    if i > 0 {
                        qb.push(" AND ");
                    }
                    match field {
                        TextField::Title => {
                            qb.push("instr(title_lc, ").push_bind(term.clone());
                            qb.push(") > 0");
                        }
                        TextField::Description => {
                            qb.push("instr(description_lc, ").push_bind(term.clone());
                            qb.push(") > 0");
                        }
                        TextField::BrandModel => {
                            qb.push("instr(brand_model_lc, ").push_bind(term.clone());
                            qb.push(") > 0");
                        }
                        TextField::CategoryName => {
                            qb.push(
                                "category_id IN (SELECT id FROM categories WHERE instr(name_lc, ",
                            )
                            .push_bind(term.clone());
                            qb.push(") > 0)");
                        }
                    }
                }
                qb.push(")");
            }
            Predicate::After {
                field,
                value,
                id,
                order,
            } => {
                let column = Self::sort_column(*field);
                let op = match order {
                    SortOrder::Desc => "<",
                    SortOrder::Asc => ">",
                };
                qb.push("(");
                qb.push(column).push(" ").push(op).push(" ");
                Self::push_sort_value(qb, value);
                qb.push(" OR (").push(column).push(" = ");
                Self::push_sort_value(qb, value);
                qb.push(" AND id ").push(op).push(" ").push_bind(id.to_string());
                qb.push("))");
            }
        }
    }

    fn push_sort_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &super::SortValue) {
        match value {
            super::SortValue::Float(v) => {
                qb.push_bind(*v);
            }
            super::SortValue::Int(v) => {
                qb.push_bind(*v);
            }
            super::SortValue::Time(t) => {
                qb.push_bind(t.timestamp_millis());
            }
        }
    }

    fn row_to_listing(row: &SqliteRow) -> Result<Listing> {
        let condition_raw: String = row.try_get("condition")?;
        let status_raw: String = row.try_get("status")?;
        let id_raw: String = row.try_get("id")?;
        let category_raw: String = row.try_get("category_id")?;
        let seller_raw: String = row.try_get("seller_id")?;
        let created_ms: i64 = row.try_get("created_at")?;
        let updated_ms: i64 = row.try_get("updated_at")?;

        Ok(Listing {
            id: Uuid::parse_str(&id_raw)?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            brand: row.try_get("brand")?,
            model: row.try_get("model")?,
            category_id: Uuid::parse_str(&category_raw)?,
            condition: Condition::parse(&condition_raw)
                .ok_or_else(|| anyhow::anyhow!("unknown condition: {condition_raw}"))?,
            price: row.try_get("price")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            negotiable: row.try_get("negotiable")?,
            pickup_available: row.try_get("pickup_available")?,
            shipping_available: row.try_get("shipping_available")?,
            status: ListingStatus::parse(&status_raw)
                .ok_or_else(|| anyhow::anyhow!("unknown status: {status_raw}"))?,
            is_active: row.try_get("is_active")?,
            views: row.try_get("views")?,
            saves: row.try_get("saves")?,
            seller_id: Uuid::parse_str(&seller_raw)?,
            created_at: DateTime::from_timestamp_millis(created_ms)
                .ok_or_else(|| anyhow::anyhow!("invalid created_at: {created_ms}"))?,
            updated_at: DateTime::from_timestamp_millis(updated_ms)
                .ok_or_else(|| anyhow::anyhow!("invalid updated_at: {updated_ms}"))?,
        })
    }
}

#[async_trait]
impl ListingStore for SqliteListingStore {
    async fn count(&self, predicate: &Predicate) -> Result<u64> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM listings WHERE ");
        Self::push_predicate(&mut qb, predicate);

        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn fetch(
        &self,
        predicate: &Predicate,
        sort: &SortSpec,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Listing>> {
        let direction = match sort.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let column = Self::sort_column(sort.field);

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT * FROM listings WHERE ");
        Self::push_predicate(&mut qb, predicate);
        qb.push(" ORDER BY ")
            .push(column)
            .push(" ")
            .push(direction)
            .push(", id ")
            .push(direction);
        qb.push(" LIMIT ").push_bind(limit as i64);
        qb.push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(Self::row_to_listing).collect()
    }

    async fn facet_rows(&self, predicate: &Predicate) -> Result<FacetRows> {
        let mut facets = FacetRows::default();

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT category_id, COUNT(*) AS n FROM listings WHERE ");
        Self::push_predicate(&mut qb, predicate);
        qb.push(" GROUP BY category_id");
        for row in qb.build().fetch_all(&self.pool).await? {
            let id_raw: String = row.try_get("category_id")?;
            let n: i64 = row.try_get("n")?;
            facets.categories.push((Uuid::parse_str(&id_raw)?, n as u64));
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT condition, COUNT(*) AS n FROM listings WHERE ");
        Self::push_predicate(&mut qb, predicate);
        qb.push(" GROUP BY condition");
        for row in qb.build().fetch_all(&self.pool).await? {
            let raw: String = row.try_get("condition")?;
            let n: i64 = row.try_get("n")?;
            if let Some(condition) = Condition::parse(&raw) {
                facets.conditions.push((condition, n as u64));
            }
        }

        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT city, state, COUNT(*) AS n FROM listings WHERE ");
        Self::push_predicate(&mut qb, predicate);
        qb.push(" GROUP BY city, state");
        for row in qb.build().fetch_all(&self.pool).await? {
            let city: String = row.try_get("city")?;
            let state: String = row.try_get("state")?;
            let n: i64 = row.try_get("n")?;
            facets.locations.push((city, state, n as u64));
        }

        Ok(facets)
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name, parent_id FROM categories")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                let id_raw: String = row.try_get("id")?;
                let parent_raw: Option<String> = row.try_get("parent_id")?;
                Ok(Category {
                    id: Uuid::parse_str(&id_raw)?,
                    name: row.try_get("name")?,
                    parent_id: parent_raw.as_deref().map(Uuid::parse_str).transpose()?,
                })
            })
            .collect()
    }
}
