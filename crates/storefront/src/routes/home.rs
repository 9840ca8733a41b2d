//! Home page route handler: the product listing.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use rocketshoes_core::{Price, Product};
use tracing::instrument;

use crate::error::Result;
use crate::filters;
use crate::state::AppState;

/// Product display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: i32,
    pub title: String,
    pub image: String,
    pub price: String,
    /// Units of this product already in the cart.
    pub in_cart: u32,
}

/// Product listing template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub products: Vec<ProductView>,
    pub cart_count: u64,
}

/// Display the product listing.
///
/// # Errors
///
/// Returns an error if the catalog can't be fetched.
#[instrument(skip(state))]
pub async fn home(State(state): State<AppState>) -> Result<HomeTemplate> {
    let products = state.api().products().await?;
    let cart = state.cart().cart();
    let amounts = cart.amounts();
    let currency = state.config().currency;

    let products = products
        .iter()
        .map(|product: &Product| ProductView {
            id: product.id.as_i32(),
            title: product.title.clone(),
            image: product.image.clone(),
            price: Price::new(product.price, currency).display(),
            in_cart: amounts.get(&product.id).copied().unwrap_or(0),
        })
        .collect();

    Ok(HomeTemplate {
        products,
        cart_count: cart.item_count(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use askama::Template;

    use super::*;

    #[test]
    fn test_listing_renders_products_and_badge() {
        let page = HomeTemplate {
            products: vec![ProductView {
                id: 7,
                title: "Runner".to_string(),
                image: "https://img.test/7.jpg".to_string(),
                price: "$179.90".to_string(),
                in_cart: 2,
            }],
            cart_count: 2,
        }
        .render()
        .unwrap();

        assert!(page.contains("Runner"));
        assert!(page.contains("$179.90"));
        assert!(page.contains(r#"<span id="product-amount-7">2</span>"#));
        assert!(page.contains("2 items</span>"));
    }
}
