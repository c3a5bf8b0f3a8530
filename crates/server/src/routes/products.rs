//! Catalog route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use loomcart_core::Email;

use crate::db::ProductRepository;
use crate::db::products::{NewProduct, Product, ProductFilter, ProductSort, ProductUpdate};
use crate::error::AppError;
use crate::middleware::auth::{Principal, RequireManager};
use crate::routes::{DeleteResult, InsertResult, UpdateResult};
use crate::state::AppState;

/// Default catalog page size when the client sends none.
const DEFAULT_PAGE_SIZE: i64 = 12;

/// Build the catalog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products/home", get(home))
        .route("/products", get(index).post(create))
        .route(
            "/products/{id}",
            get(show).patch(update).delete(delete_product),
        )
        .route("/products/toggle-home/{id}", patch(toggle_home))
        .route("/all-products/{email}", get(list_for_manager))
}

/// Newest products for the public home page.
///
/// # Errors
///
/// Returns `AppError::Database` if the store fails.
pub async fn home(State(state): State<AppState>) -> Result<Json<Vec<Product>>, AppError> {
    let products = ProductRepository::new(state.pool()).list_home().await?;
    Ok(Json(products))
}

/// Catalog browse query parameters.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<String>,
    #[serde(default)]
    pub page: i64,
    pub page_size: Option<i64>,
}

/// One catalog page plus the full filtered count.
#[derive(Debug, Serialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    pub total: i64,
}

/// Paged, filtered, sorted catalog listing.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a negative page or non-positive page
/// size, `AppError::Database` if the store fails.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> Result<Json<ProductListResponse>, AppError> {
    if query.page < 0 {
        return Err(AppError::BadRequest("page must be >= 0".to_owned()));
    }
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page_size <= 0 {
        return Err(AppError::BadRequest("pageSize must be > 0".to_owned()));
    }

    let filter = ProductFilter {
        search: query.search,
        category: query.category,
        min_price: query.min_price,
        max_price: query.max_price,
    };
    let sort = ProductSort::parse_param(query.sort.as_deref());

    let page = ProductRepository::new(state.pool())
        .list_paged(&filter, sort, query.page, page_size)
        .await?;

    Ok(Json(ProductListResponse {
        products: page.products,
        total: page.total,
    }))
}

/// Single product by id.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the product does not exist and
/// `AppError::Database` if the store fails.
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Product>, AppError> {
    let product = ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    Ok(Json(product))
}

/// Seller- or admin-scoped product list.
///
/// The path still carries an email segment for URL compatibility, but the
/// scope always comes from the verified caller: admins see everything,
/// managers see their own catalog.
///
/// # Errors
///
/// Returns `AppError::Database` if the store fails.
pub async fn list_for_manager(
    RequireManager(principal): RequireManager,
    State(state): State<AppState>,
    Path(_email): Path<String>,
) -> Result<Json<Vec<Product>>, AppError> {
    let repo = ProductRepository::new(state.pool());
    let products = if principal.role.is_admin() {
        repo.list_all().await?
    } else {
        repo.list_for_seller(&principal.email).await?
    };

    Ok(Json(products))
}

/// Product creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub name: String,
    pub price: Decimal,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub seller_email: String,
    #[serde(default)]
    pub show_on_home: bool,
}

/// Create a product.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a negative price or unusable seller
/// email, `AppError::Database` if the store fails.
pub async fn create(
    RequireManager(_principal): RequireManager,
    State(state): State<AppState>,
    Json(body): Json<CreateProductRequest>,
) -> Result<Json<InsertResult<Uuid>>, AppError> {
    if body.price.is_sign_negative() {
        return Err(AppError::BadRequest("price must be >= 0".to_owned()));
    }
    let seller_email = Email::parse(&body.seller_email)
        .map_err(|e| AppError::BadRequest(format!("sellerEmail: {e}")))?
        .normalized();

    let id = ProductRepository::new(state.pool())
        .create(&NewProduct {
            name: body.name,
            price: body.price,
            category: body.category,
            description: body.description,
            images: body.images,
            seller_email,
            show_on_home: body.show_on_home,
        })
        .await?;

    Ok(Json(InsertResult::new(id)))
}

/// Product update request; omitted fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
}

/// Update a product's fields.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown product,
/// `AppError::Forbidden` when a manager touches another seller's product,
/// `AppError::BadRequest` for a negative price.
pub async fn update(
    RequireManager(principal): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<UpdateResult>, AppError> {
    if body.price.is_some_and(|price| price.is_sign_negative()) {
        return Err(AppError::BadRequest("price must be >= 0".to_owned()));
    }

    let repo = ProductRepository::new(state.pool());
    ensure_owner(&repo, id, &principal).await?;

    let matched = repo
        .update(
            id,
            &ProductUpdate {
                name: body.name,
                price: body.price,
                category: body.category,
                description: body.description,
                images: body.images,
            },
        )
        .await?;

    let matched = i64::try_from(matched).unwrap_or(i64::MAX);
    Ok(Json(UpdateResult::new(matched, matched)))
}

/// Home-visibility toggle request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleHomeRequest {
    pub show_on_home: bool,
}

/// Toggle a product's home-page visibility.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown product and
/// `AppError::Forbidden` when a manager touches another seller's product.
pub async fn toggle_home(
    RequireManager(principal): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ToggleHomeRequest>,
) -> Result<Json<UpdateResult>, AppError> {
    let repo = ProductRepository::new(state.pool());
    ensure_owner(&repo, id, &principal).await?;

    let matched = repo.set_show_on_home(id, body.show_on_home).await?;
    let matched = i64::try_from(matched).unwrap_or(i64::MAX);
    Ok(Json(UpdateResult::new(matched, matched)))
}

/// Delete a product.
///
/// # Errors
///
/// Returns `AppError::NotFound` for an unknown product and
/// `AppError::Forbidden` when a manager touches another seller's product.
pub async fn delete_product(
    RequireManager(principal): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResult>, AppError> {
    let repo = ProductRepository::new(state.pool());
    ensure_owner(&repo, id, &principal).await?;

    let deleted = repo.delete(id).await?;
    Ok(Json(DeleteResult {
        acknowledged: true,
        deleted_count: i64::try_from(deleted).unwrap_or(i64::MAX),
    }))
}

/// Check that the caller may mutate this product: admins always, managers
/// only on their own catalog.
async fn ensure_owner(
    repo: &ProductRepository<'_>,
    id: Uuid,
    principal: &Principal,
) -> Result<(), AppError> {
    let product = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;

    if !principal.role.is_admin() && product.seller_email != principal.email {
        return Err(AppError::Forbidden(
            "Forbidden: you do not own this product".to_owned(),
        ));
    }

    Ok(())
}
