//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! Every mutation goes through the [`CartStore`](crate::cart::CartStore); a
//! rejected mutation renders the store's notification instead of an error
//! status, so HTMX still swaps it in.

use std::convert::Infallible;
use std::num::NonZeroU32;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{State, rejection::FormRejection},
    response::{
        AppendHeaders, IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::{Stream, StreamExt};
use rocketshoes_core::{Cart, CartItem, CurrencyCode, Price, ProductId};
use serde::Deserialize;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tracing::instrument;

use crate::cart::{CartError, CartOperation, Notification};
use crate::filters;
use crate::state::AppState;

/// HTMX event fired after every committed cart change.
pub const CART_UPDATED_TRIGGER: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub id: i32,
    pub title: String,
    pub image: String,
    pub price: String,
    pub amount: u32,
    pub subtotal: String,
}

impl CartItemView {
    fn new(item: &CartItem, currency: CurrencyCode) -> Self {
        Self {
            id: item.id.as_i32(),
            title: item.title.clone(),
            image: item.image.clone(),
            price: Price::new(item.price, currency).display(),
            amount: item.amount.get(),
            subtotal: Price::new(item.subtotal(), currency).display(),
        }
    }

    /// The decrement control is disabled at one unit; removal is explicit.
    #[must_use]
    pub const fn can_decrement(&self) -> bool {
        self.amount > 1
    }

    #[must_use]
    pub const fn decremented(&self) -> u32 {
        self.amount.saturating_sub(1)
    }

    #[must_use]
    pub const fn incremented(&self) -> u32 {
        self.amount.saturating_add(1)
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub item_count: u64,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, currency: CurrencyCode) -> Self {
        Self {
            items: cart
                .items()
                .iter()
                .map(|item| CartItemView::new(item, currency))
                .collect(),
            total: Price::new(cart.total(), currency).display(),
            item_count: cart.item_count(),
        }
    }
}

/// Form naming a product.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub product_id: ProductId,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub product_id: ProductId,
    pub amount: u32,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub cart_count: u64,
    pub notification: Option<Notification>,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
    pub notification: Option<Notification>,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u64,
}

/// Response to a successful add: the badge plus the listing's per-product amount.
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_added.html")]
pub struct CartAddedTemplate {
    pub count: u64,
    pub product_id: i32,
    pub amount: u32,
}

/// Toast fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/notification.html")]
pub struct NotificationTemplate {
    pub notification: Notification,
}

/// Render the cart-items fragment for `cart`.
fn items_fragment(
    state: &AppState,
    cart: &Cart,
    notification: Option<Notification>,
) -> CartItemsTemplate {
    CartItemsTemplate {
        cart: CartView::new(cart, state.config().currency),
        notification,
    }
}

/// Render a notification into the page-level toast area instead of the
/// element that issued the request.
fn toast(notification: Notification) -> Response {
    (
        AppendHeaders([("HX-Retarget", "#notifications"), ("HX-Reswap", "innerHTML")]),
        NotificationTemplate { notification },
    )
        .into_response()
}

/// Report a form the extractor refused; the user gets the operation's notification.
fn rejected(
    state: &AppState,
    operation: CartOperation,
    rejection: &FormRejection,
) -> Notification {
    let error = CartError::InvalidRequest(rejection.body_text());
    state.cart().report(operation, &error)
}

/// Display cart page.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> impl IntoResponse {
    let cart = state.cart().cart();

    CartShowTemplate {
        cart_count: cart.item_count(),
        cart: CartView::new(&cart, state.config().currency),
        notification: None,
    }
}

/// Add one unit of a product (HTMX).
///
/// Returns the cart count badge with an HTMX trigger, or a toast.
#[instrument(skip(state))]
pub async fn add(
    State(state): State<AppState>,
    form: Result<Form<ProductForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => return toast(rejected(&state, CartOperation::AddProduct, &rejection)),
    };

    match state.cart().add_product(form.product_id).await {
        Ok(cart) => {
            let amount = cart
                .get(form.product_id)
                .map_or(0, |item| item.amount.get());
            (
                AppendHeaders([CART_UPDATED_TRIGGER]),
                CartAddedTemplate {
                    count: cart.item_count(),
                    product_id: form.product_id.as_i32(),
                    amount,
                },
            )
                .into_response()
        }
        Err(notification) => toast(notification),
    }
}

/// Update cart item quantity (HTMX).
#[instrument(skip(state))]
pub async fn update(
    State(state): State<AppState>,
    form: Result<Form<UpdateCartForm>, FormRejection>,
) -> Response {
    let store = state.cart();

    let result = match form {
        Ok(Form(form)) => match NonZeroU32::new(form.amount) {
            Some(amount) => store.set_quantity(form.product_id, amount).await,
            None => Err(store.report(CartOperation::UpdateQuantity, &CartError::ZeroAmount)),
        },
        Err(rejection) => Err(rejected(&state, CartOperation::UpdateQuantity, &rejection)),
    };

    match result {
        Ok(cart) => (
            AppendHeaders([CART_UPDATED_TRIGGER]),
            items_fragment(&state, &cart, None),
        )
            .into_response(),
        Err(notification) => {
            items_fragment(&state, &store.cart(), Some(notification)).into_response()
        }
    }
}

/// Remove item from cart (HTMX).
#[instrument(skip(state))]
pub async fn remove(
    State(state): State<AppState>,
    form: Result<Form<ProductForm>, FormRejection>,
) -> Response {
    let store = state.cart();

    let result = match form {
        Ok(Form(form)) => store.remove_product(form.product_id).await,
        Err(rejection) => Err(rejected(&state, CartOperation::RemoveProduct, &rejection)),
    };

    match result {
        Ok(cart) => (
            AppendHeaders([CART_UPDATED_TRIGGER]),
            items_fragment(&state, &cart, None),
        )
            .into_response(),
        Err(notification) => {
            items_fragment(&state, &store.cart(), Some(notification)).into_response()
        }
    }
}

/// Get cart count badge (HTMX).
#[instrument(skip(state))]
pub async fn count(State(state): State<AppState>) -> impl IntoResponse {
    CartCountTemplate {
        count: state.cart().cart().item_count(),
    }
}

/// Stream cart changes and notifications as server-sent events.
///
/// - `cart` events carry the new item count
/// - `notification` events carry the rendered toast, swapped into
///   `#notifications` by the page
#[instrument(skip(state))]
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let carts = WatchStream::from_changes(state.cart().subscribe()).map(|cart| {
        Ok(Event::default()
            .event("cart")
            .data(cart.item_count().to_string()))
    });

    // Lagged receivers skip what they missed; the next cart event resyncs them.
    let notifications = BroadcastStream::new(state.cart().notifications())
        .filter_map(|received| futures::future::ready(received.ok()))
        .map(|notification| {
            let message = notification.message;
            let html = NotificationTemplate { notification }
                .render()
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "Failed to render notification");
                    message.to_string()
                });
            Ok(Event::default().event("notification").data(html))
        });

    Sse::new(futures::stream::select(carts, notifications)).keep_alive(KeepAlive::default())
}
