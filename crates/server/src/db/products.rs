//! Catalog repository: per-seller products with public paged browsing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use loomcart_core::Email;

use super::RepositoryError;

/// Number of products shown on the home page.
pub const HOME_PAGE_LIMIT: i64 = 6;

/// A catalog product.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Primary key.
    pub id: Uuid,
    /// Display name, searched by substring.
    pub name: String,
    /// Unit price, non-negative.
    pub price: Decimal,
    /// Free-form category label.
    pub category: String,
    /// Long description.
    pub description: String,
    /// Ordered image URIs.
    pub images: Vec<String>,
    /// Owning manager.
    pub seller_email: Email,
    /// Whether the product is featured on the home page.
    pub show_on_home: bool,
    /// Server-stamped creation time.
    pub created_at: DateTime<Utc>,
}

/// Fields for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub category: String,
    pub description: String,
    pub images: Vec<String>,
    pub seller_email: Email,
    pub show_on_home: bool,
}

/// Partial update for a product; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
}

impl ProductUpdate {
    /// Whether the update carries no fields at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.images.is_none()
    }
}

/// Catalog browse filter.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring match on name.
    pub search: Option<String>,
    /// Exact category match.
    pub category: Option<String>,
    /// Inclusive lower price bound.
    pub min_price: Option<Decimal>,
    /// Inclusive upper price bound.
    pub max_price: Option<Decimal>,
}

/// Catalog sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSort {
    /// Newest first (the default).
    #[default]
    Newest,
    /// Cheapest first.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
}

impl ProductSort {
    /// Parse the client's `sort` query parameter; unknown values fall back
    /// to the default ordering.
    #[must_use]
    pub fn parse_param(param: Option<&str>) -> Self {
        match param {
            Some("price-asc") => Self::PriceAsc,
            Some("price-desc") => Self::PriceDesc,
            _ => Self::Newest,
        }
    }

    const fn order_clause(self) -> &'static str {
        match self {
            Self::Newest => " ORDER BY created_at DESC",
            Self::PriceAsc => " ORDER BY price ASC",
            Self::PriceDesc => " ORDER BY price DESC",
        }
    }
}

/// One page of catalog results plus the full filtered count.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub total: i64,
}

/// Compute the row offset for a zero-based page.
#[must_use]
pub const fn page_offset(page: i64, page_size: i64) -> i64 {
    page.saturating_mul(page_size)
}

/// Escape LIKE wildcards in a user-supplied search term.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

const SELECT_COLUMNS: &str =
    "SELECT id, name, price, category, description, images, seller_email, show_on_home, created_at FROM products";

/// Append the filter's WHERE clauses to a query under construction.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    qb.push(" WHERE TRUE");
    if let Some(search) = &filter.search {
        qb.push(" AND name ILIKE ")
            .push_bind(format!("%{}%", escape_like(search)));
    }
    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price <= ").push_bind(max);
    }
}

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Newest products for the public home page.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_home(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(HOME_PAGE_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// One filtered, sorted page of the catalog plus the total filtered count.
    ///
    /// The count is computed against the same filter regardless of the page
    /// window so clients can render pagination controls.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if either query fails.
    pub async fn list_paged(
        &self,
        filter: &ProductFilter,
        sort: ProductSort,
        page: i64,
        page_size: i64,
    ) -> Result<ProductPage, RepositoryError> {
        let mut count_qb = QueryBuilder::new("SELECT COUNT(*) FROM products");
        push_filter(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar().fetch_one(self.pool).await?;

        let mut qb = QueryBuilder::new(SELECT_COLUMNS);
        push_filter(&mut qb, filter);
        qb.push(sort.order_clause());
        qb.push(" LIMIT ").push_bind(page_size);
        qb.push(" OFFSET ").push_bind(page_offset(page, page_size));

        let products = qb.build_query_as().fetch_all(self.pool).await?;

        Ok(ProductPage { products, total })
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: Uuid) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(product)
    }

    /// All products owned by one seller, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_seller(&self, seller: &Email) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "{SELECT_COLUMNS} WHERE seller_email = $1 ORDER BY created_at DESC"
        ))
        .bind(seller)
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// The whole catalog, newest first (admin view).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let products =
            sqlx::query_as::<_, Product>(&format!("{SELECT_COLUMNS} ORDER BY created_at DESC"))
                .fetch_all(self.pool)
                .await?;

        Ok(products)
    }

    /// Insert a product, stamping `created_at` server-side.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Uuid, RepositoryError> {
        let id: Uuid = sqlx::query_scalar(
            r"
            INSERT INTO products
                (name, price, category, description, images, seller_email, show_on_home)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            ",
        )
        .bind(&product.name)
        .bind(product.price)
        .bind(&product.category)
        .bind(&product.description)
        .bind(&product.images)
        .bind(&product.seller_email)
        .bind(product.show_on_home)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Apply a partial update.
    ///
    /// Returns the number of rows matched (0 when the id is unknown or the
    /// update carries no fields).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(&self, id: Uuid, fields: &ProductUpdate) -> Result<u64, RepositoryError> {
        if fields.is_empty() {
            return Ok(0);
        }

        let mut qb = QueryBuilder::new("UPDATE products SET ");
        let mut set = qb.separated(", ");
        if let Some(name) = &fields.name {
            set.push("name = ").push_bind_unseparated(name.clone());
        }
        if let Some(price) = fields.price {
            set.push("price = ").push_bind_unseparated(price);
        }
        if let Some(category) = &fields.category {
            set.push("category = ").push_bind_unseparated(category.clone());
        }
        if let Some(description) = &fields.description {
            set.push("description = ")
                .push_bind_unseparated(description.clone());
        }
        if let Some(images) = &fields.images {
            set.push("images = ").push_bind_unseparated(images.clone());
        }
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb.build().execute(self.pool).await?;

        Ok(result.rows_affected())
    }

    /// Flip the home-page visibility flag.
    ///
    /// Returns the number of rows matched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_show_on_home(&self, id: Uuid, show: bool) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET show_on_home = $1
            WHERE id = $2
            ",
        )
        .bind(show)
        .bind(id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete a product.
    ///
    /// Returns the number of rows deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: Uuid) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(0, 12), 0);
        assert_eq!(page_offset(3, 12), 36);
        assert_eq!(page_offset(1, 1), 1);
    }

    #[test]
    fn test_sort_param_parsing() {
        assert_eq!(ProductSort::parse_param(Some("price-asc")), ProductSort::PriceAsc);
        assert_eq!(ProductSort::parse_param(Some("price-desc")), ProductSort::PriceDesc);
        assert_eq!(ProductSort::parse_param(Some("newest")), ProductSort::Newest);
        assert_eq!(ProductSort::parse_param(Some("garbage")), ProductSort::Newest);
        assert_eq!(ProductSort::parse_param(None), ProductSort::Newest);
    }

    #[test]
    fn test_escape_like_wildcards() {
        assert_eq!(escape_like("100% cotton"), "100\\% cotton");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }

    #[test]
    fn test_empty_update_detection() {
        assert!(ProductUpdate::default().is_empty());
        let update = ProductUpdate {
            name: Some("Denim jacket".to_owned()),
            ..ProductUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
