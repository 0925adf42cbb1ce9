//! Cart route handlers.
//!
//! Prices and stock bounds come from the platform catalog, never from
//! client input; the client only names a medicine and a quantity.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use fernhill_core::{MedicineId, ServiceSlug};

use crate::cart::Cart;
use crate::error::{AppError, Result};
use crate::state::AppState;

use super::{load_cart, save_cart, session_store};

/// Cart line display data.
#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub key: String,
    pub name: String,
    pub variation: Option<String>,
    pub quantity: u32,
    pub unit_price_minor: i64,
    pub unit_price: String,
    pub line_total_minor: i64,
    pub line_total: String,
}

/// Cart display data.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal_minor: i64,
    pub subtotal: String,
    pub item_count: u32,
}

impl CartView {
    fn from_cart(cart: &Cart) -> Result<Self> {
        let mut items = Vec::with_capacity(cart.items().len());
        for item in cart.items() {
            let line = item.line_total().map_err(crate::cart::CartError::from)?;
            items.push(CartItemView {
                key: item.key.clone(),
                name: item.name.clone(),
                variation: item.variation.clone(),
                quantity: item.quantity,
                unit_price_minor: item.unit_price.minor(),
                unit_price: item.unit_price.display(),
                line_total_minor: line.minor(),
                line_total: line.display(),
            });
        }
        let subtotal = cart.subtotal().map_err(crate::cart::CartError::from)?;
        Ok(Self {
            items,
            subtotal_minor: subtotal.minor(),
            subtotal: subtotal.display(),
            item_count: cart.item_count(),
        })
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddForm {
    pub medicine_id: MedicineId,
    pub quantity: Option<u32>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateForm {
    pub key: String,
    pub quantity: u32,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveForm {
    pub key: String,
}

/// Show the cart for a service.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<ServiceSlug>,
) -> Result<Json<CartView>> {
    let store = session_store(&state, &session).await;
    let cart = load_cart(&state, &store, &slug);
    Ok(Json(CartView::from_cart(&cart)?))
}

/// Add a treatment to the cart.
#[instrument(skip(state, session, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<ServiceSlug>,
    Json(form): Json<AddForm>,
) -> Result<Json<CartView>> {
    let store = session_store(&state, &session).await;

    let medicines = state.platform().get_medicines(&slug).await?;
    let medicine = medicines
        .into_iter()
        .find(|m| m.id == form.medicine_id)
        .ok_or_else(|| AppError::NotFound(format!("medicine {}", form.medicine_id)))?;

    let mut cart = load_cart(&state, &store, &slug);
    cart.add(&medicine, form.quantity.unwrap_or(1))?;
    save_cart(&store, &slug, &cart);

    Ok(Json(CartView::from_cart(&cart)?))
}

/// Change a line's quantity. Zero removes the line.
#[instrument(skip(state, session, form))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<ServiceSlug>,
    Json(form): Json<UpdateForm>,
) -> Result<Json<CartView>> {
    let store = session_store(&state, &session).await;

    let mut cart = load_cart(&state, &store, &slug);
    cart.set_quantity(&form.key, form.quantity);
    save_cart(&store, &slug, &cart);

    Ok(Json(CartView::from_cart(&cart)?))
}

/// Remove a line.
#[instrument(skip(state, session, form))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(slug): Path<ServiceSlug>,
    Json(form): Json<RemoveForm>,
) -> Result<Json<CartView>> {
    let store = session_store(&state, &session).await;

    let mut cart = load_cart(&state, &store, &slug);
    cart.remove(&form.key);
    save_cart(&store, &slug, &cart);

    Ok(Json(CartView::from_cart(&cart)?))
}
