//! Visitor-facing routes: catalog, cart, checkout and the two mail forms.
//!
//! Pages are rendered elsewhere; these handlers return the page data as JSON
//! and answer form posts with 303 redirects plus a flash message.

use axum::{
    extract::{Form, Path, State},
    response::Redirect,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_cookies::Cookies;

use crate::errors::AppError;
use crate::inbound::http::flash::{redirect_with_flash, take_flash, Flash, FlashKind};
use crate::inbound::http::server::AppState;
use shop_types::domain::cart::{Cart, CartLine};
use shop_types::domain::catalog::CategorySection;
use shop_types::domain::inventory::{InventoryInfo, ProductContent};
use shop_types::domain::money::format_eur;
use shop_types::domain::order::ShippingInfo;
use shop_types::domain::product::{Product, ProductId};
use shop_types::ports::order_repository::OrderRepository;

#[derive(Serialize)]
pub struct IndexView<'a> {
    sections: Vec<CategorySection<'a>>,
    cart_items: u32,
    flash: Option<Flash>,
}

#[derive(Serialize)]
pub struct ProductView {
    product: Product,
    inventory: Option<InventoryInfo>,
    content: Option<ProductContent>,
    flash: Option<Flash>,
}

#[derive(Serialize)]
pub struct CartView {
    lines: Vec<CartLine>,
    total_cents: i64,
    total: String,
    flash: Option<Flash>,
}

impl CartView {
    fn new(cart: Cart, flash: Option<Flash>) -> Self {
        let total_cents = cart.total_cents();
        Self {
            lines: cart.lines().to_vec(),
            total_cents,
            total: format_eur(total_cents),
            flash,
        }
    }
}

#[derive(Serialize)]
pub struct PageView {
    page: &'static str,
    message: &'static str,
    flash: Option<Flash>,
}

#[derive(Deserialize)]
pub struct AddToCartForm {
    pub produkt_id: ProductId,
}

#[derive(Deserialize)]
pub struct CheckoutForm {
    #[serde(default)]
    pub email: String,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Deserialize)]
pub struct NewsletterForm {
    #[serde(default)]
    pub email: String,
}

pub async fn index<R>(
    State(state): State<Arc<AppState<R>>>,
    cookies: Cookies,
) -> Result<Json<serde_json::Value>, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    let session = state.session(&cookies);
    let cart = state.carts.get(session).await?;
    let view = IndexView {
        sections: state.catalog().sections(),
        cart_items: cart.lines().iter().map(|l| l.quantity).sum(),
        flash: take_flash(&cookies),
    };
    Ok(Json(serde_json::to_value(view).map_err(anyhow::Error::from)?))
}

pub async fn product_detail<R>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    cookies: Cookies,
) -> Result<Json<ProductView>, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    let product = id
        .parse::<ProductId>()
        .ok()
        .and_then(|pid| state.catalog().get(pid))
        .ok_or_else(|| AppError::NotFound(format!("product {}", id)))?
        .clone();

    let (inventory, content) = match product.ean.as_deref() {
        Some(ean) if state.oracle.is_configured() => tokio::join!(
            state.oracle.lookup_price(ean),
            state.oracle.lookup_content(ean)
        ),
        _ => (None, None),
    };

    Ok(Json(ProductView {
        product,
        inventory,
        content,
        flash: take_flash(&cookies),
    }))
}

pub async fn add_to_cart<R>(
    State(state): State<Arc<AppState<R>>>,
    cookies: Cookies,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    let session = state.session(&cookies);
    state.carts.add(session, form.produkt_id).await?;
    Ok(Redirect::to("/cart"))
}

pub async fn cart<R>(
    State(state): State<Arc<AppState<R>>>,
    cookies: Cookies,
) -> Result<Json<CartView>, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    let session = state.session(&cookies);
    let cart = state.carts.get(session).await?;
    Ok(Json(CartView::new(cart, take_flash(&cookies))))
}

pub async fn remove_from_cart<R>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    cookies: Cookies,
) -> Result<Redirect, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    // An id that cannot be a product cannot be in the cart either.
    if let Ok(pid) = id.parse::<ProductId>() {
        let session = state.session(&cookies);
        state.carts.remove(session, pid).await?;
    }
    Ok(Redirect::to("/cart"))
}

pub async fn checkout_view<R>(
    State(state): State<Arc<AppState<R>>>,
    cookies: Cookies,
) -> Result<Json<CartView>, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    let session = state.session(&cookies);
    let cart = state.carts.get(session).await?;
    Ok(Json(CartView::new(cart, take_flash(&cookies))))
}

pub async fn checkout<R>(
    State(state): State<Arc<AppState<R>>>,
    cookies: Cookies,
    Form(form): Form<CheckoutForm>,
) -> Result<Redirect, AppError>
where
    R: OrderRepository + Send + Sync + 'static,
{
    let session = state.session(&cookies);
    let shipping = ShippingInfo {
        name: form.name,
        address: form.address,
        phone: form.phone,
    };

    match state.orders.checkout(session, form.email, shipping).await {
        Ok(placed) => Ok(redirect_with_flash(
            &cookies,
            state.secure_cookies(),
            "/bestelldanke",
            FlashKind::Success,
            format!(
                "Bestellung erfolgreich! Ihre Bestellnummer lautet {}.",
                placed.order.id
            ),
        )),
        Err(AppError::BadRequest(reason)) => {
            tracing::debug!(%reason, "checkout rejected");
            Ok(redirect_with_flash(
                &cookies,
                state.secure_cookies(),
                "/checkout",
                FlashKind::Error,
                "Bitte gültige Daten eingeben.",
            ))
        }
        Err(AppError::OrderFailed(_)) => Ok(redirect_with_flash(
            &cookies,
            state.secure_cookies(),
            "/checkout",
            FlashKind::Error,
            "Die Bestellung konnte nicht abgeschlossen werden. Bitte versuchen Sie es später erneut.",
        )),
        Err(e) => Err(e),
    }
}

pub async fn contact_view(cookies: Cookies) -> Json<PageView> {
    Json(PageView {
        page: "kontakt",
        message: "Schreib uns eine Nachricht.",
        flash: take_flash(&cookies),
    })
}

pub async fn contact_submit<R>(
    State(state): State<Arc<AppState<R>>>,
    cookies: Cookies,
    Form(form): Form<ContactForm>,
) -> Redirect
where
    R: OrderRepository + Send + Sync + 'static,
{
    match state
        .inbox
        .contact(&form.name, &form.email, &form.message)
        .await
    {
        Ok(()) => redirect_with_flash(
            &cookies,
            state.secure_cookies(),
            "/kontaktdanke",
            FlashKind::Success,
            "Danke! Deine Nachricht wurde gesendet.",
        ),
        Err(AppError::BadRequest(_)) => redirect_with_flash(
            &cookies,
            state.secure_cookies(),
            "/kontakt",
            FlashKind::Error,
            "Bitte fülle alle Felder aus!",
        ),
        Err(_) => redirect_with_flash(
            &cookies,
            state.secure_cookies(),
            "/kontaktdanke",
            FlashKind::Warning,
            "Deine Nachricht konnte gerade nicht zugestellt werden. Bitte versuche es später erneut.",
        ),
    }
}

pub async fn newsletter<R>(
    State(state): State<Arc<AppState<R>>>,
    cookies: Cookies,
    Form(form): Form<NewsletterForm>,
) -> Redirect
where
    R: OrderRepository + Send + Sync + 'static,
{
    match state.inbox.newsletter(&form.email).await {
        Ok(()) => redirect_with_flash(
            &cookies,
            state.secure_cookies(),
            "/danke",
            FlashKind::Success,
            "Danke! Newsletter-Anmeldung erfolgreich.",
        ),
        Err(AppError::BadRequest(_)) => redirect_with_flash(
            &cookies,
            state.secure_cookies(),
            "/",
            FlashKind::Error,
            "Bitte gib eine gültige E-Mail-Adresse ein.",
        ),
        Err(_) => redirect_with_flash(
            &cookies,
            state.secure_cookies(),
            "/danke",
            FlashKind::Warning,
            "Die Anmeldung konnte gerade nicht übermittelt werden.",
        ),
    }
}

fn page(page: &'static str, message: &'static str, cookies: &Cookies) -> Json<PageView> {
    Json(PageView {
        page,
        message,
        flash: take_flash(cookies),
    })
}

pub async fn thanks(cookies: Cookies) -> Json<PageView> {
    page("danke", "Danke für deine Anmeldung!", &cookies)
}

pub async fn contact_thanks(cookies: Cookies) -> Json<PageView> {
    page("kontaktdanke", "Danke für deine Nachricht!", &cookies)
}

pub async fn order_thanks(cookies: Cookies) -> Json<PageView> {
    page("bestelldanke", "Danke für deine Bestellung!", &cookies)
}
