//! Integration tests for Rocket Shoes.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p rocketshoes-integration-tests
//! ```
//!
//! Nothing external is needed: [`TestContext::start`] spawns an in-process
//! catalog and stock service on an ephemeral port and points a real
//! [`ApiClient`] at it. Carts are persisted to a temporary directory, so a
//! test can reopen the store and inspect the snapshot file.
//!
//! # Test Categories
//!
//! - `cart_store` - Cart store behavior against the HTTP catalog
//! - `storefront` - Storefront routes driven through the router

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::{Body, BodyDataStream},
    extract::{Query, State},
    http::{HeaderMap, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use rocketshoes_core::{CurrencyCode, ProductId};
use rocketshoes_storefront::api::ApiClient;
use rocketshoes_storefront::cart::{CartError, CartStore, FileSlot};
use rocketshoes_storefront::config::StorefrontConfig;
use rocketshoes_storefront::state::AppState;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::RwLock;
use tower::ServiceExt;
use url::Url;

/// The catalog every test context starts with.
///
/// - 1: "Shoe" at 100, 5 in stock
/// - 2: "Runner" at 179.9, 1 in stock
/// - 3: "Sandal" at 59.9, stock lookups fail with HTTP 500
fn seed_products() -> Vec<Value> {
    vec![
        json!({ "id": 1, "title": "Shoe", "price": 100, "image": "x" }),
        json!({ "id": 2, "title": "Runner", "price": 179.9, "image": "https://img.test/runner.jpg" }),
        json!({ "id": 3, "title": "Sandal", "price": 59.9, "image": "https://img.test/sandal.jpg" }),
    ]
}

#[derive(Debug, Deserialize)]
struct IdFilter {
    id: Option<i32>,
}

/// Mutable state behind the fake catalog and stock service.
#[derive(Clone, Default)]
pub struct FakeService {
    products: Arc<RwLock<Vec<Value>>>,
    stock: Arc<RwLock<HashMap<i32, u32>>>,
    failing_stock: Arc<RwLock<HashSet<i32>>>,
}

impl FakeService {
    fn seeded() -> Self {
        Self {
            products: Arc::new(RwLock::new(seed_products())),
            stock: Arc::new(RwLock::new(HashMap::from([(1, 5), (2, 1)]))),
            failing_stock: Arc::new(RwLock::new(HashSet::from([3]))),
        }
    }

    /// Change the available amount reported for `id`.
    pub async fn set_stock(&self, id: i32, amount: u32) {
        self.stock.write().await.insert(id, amount);
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/products", get(list_products))
            .route("/stock", get(list_stock))
            .with_state(self.clone())
    }
}

async fn list_products(
    State(service): State<FakeService>,
    Query(filter): Query<IdFilter>,
) -> Json<Vec<Value>> {
    let products = service.products.read().await;
    let matching = products
        .iter()
        .filter(|product| filter.id.is_none_or(|id| product["id"] == id))
        .cloned()
        .collect();
    Json(matching)
}

async fn list_stock(
    State(service): State<FakeService>,
    Query(filter): Query<IdFilter>,
) -> Response {
    let Some(id) = filter.id else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    if service.failing_stock.read().await.contains(&id) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let records: Vec<Value> = service
        .stock
        .read()
        .await
        .get(&id)
        .map(|amount| json!({ "id": id, "amount": amount }))
        .into_iter()
        .collect();
    Json(records).into_response()
}

/// A running fake service plus a temporary cart file.
pub struct TestContext {
    pub service: FakeService,
    pub api_url: Url,
    pub cart_path: PathBuf,
    _dir: TempDir,
}

impl TestContext {
    /// Spawn the fake service and prepare an empty cart location.
    ///
    /// # Panics
    ///
    /// Panics if the listener can't be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let service = FakeService::seeded();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake service");
        let addr = listener.local_addr().expect("Failed to read local address");

        let router = service.router();
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let api_url = Url::parse(&format!("http://{addr}/")).expect("Invalid service URL");

        Self {
            service,
            api_url,
            cart_path: dir.path().join("data/rocketshoes-cart.json"),
            _dir: dir,
        }
    }

    /// A client for the fake service.
    #[must_use]
    pub fn api(&self) -> ApiClient {
        ApiClient::new(self.api_url.clone())
    }

    /// Open a store over the context's cart file.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart file holds an invalid snapshot.
    pub async fn open_store(&self) -> Result<CartStore, CartError> {
        let api = self.api();
        CartStore::open(
            Arc::new(api.clone()),
            Arc::new(api),
            Arc::new(FileSlot::new(self.cart_path.clone())),
        )
        .await
    }

    /// The snapshot file as JSON, if it has been written.
    ///
    /// # Panics
    ///
    /// Panics if the file exists but isn't JSON.
    #[allow(clippy::expect_used)]
    pub async fn snapshot(&self) -> Option<Value> {
        let contents = tokio::fs::read_to_string(&self.cart_path).await.ok()?;
        Some(serde_json::from_str(&contents).expect("Snapshot is not JSON"))
    }

    fn config(&self) -> StorefrontConfig {
        StorefrontConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            api_url: self.api_url.clone(),
            cart_path: self.cart_path.clone(),
            currency: CurrencyCode::USD,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Build the storefront around a freshly opened store.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart file holds an invalid snapshot.
    pub async fn storefront(&self) -> Result<Storefront, CartError> {
        let cart = self.open_store().await?;
        let state = AppState::new(self.config(), self.api(), cart);
        let router = rocketshoes_storefront::app(state.clone(), "static");
        Ok(Storefront { router, state })
    }
}

/// The storefront router plus a handle on its state.
pub struct Storefront {
    pub router: Router,
    pub state: AppState,
}

/// A buffered response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Value of `name`, if present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

impl Storefront {
    /// GET `uri`.
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::get(uri).body(Body::empty())).await
    }

    /// POST a urlencoded form to `uri`.
    pub async fn post_form(&self, uri: &str, form: &str) -> TestResponse {
        self.send(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(form.to_string())),
        )
        .await
    }

    /// Open `GET /cart/events` and return the live event stream.
    ///
    /// # Panics
    ///
    /// Panics if the route doesn't answer with an event stream.
    #[allow(clippy::expect_used)]
    pub async fn events(&self) -> EventStream {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::get("/cart/events")
                    .body(Body::empty())
                    .expect("Failed to build request"),
            )
            .await
            .expect("Router is infallible");

        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("text/event-stream")
        );

        EventStream {
            body: response.into_body().into_data_stream(),
            buffer: String::new(),
        }
    }

    #[allow(clippy::expect_used)]
    async fn send(&self, request: axum::http::Result<Request<Body>>) -> TestResponse {
        let request = request.expect("Failed to build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");

        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    /// Current amount of `id` in the cart, or 0.
    #[must_use]
    pub fn amount_of(&self, id: i32) -> u32 {
        self.state
            .cart()
            .cart()
            .get(ProductId::new(id))
            .map_or(0, |item| item.amount.get())
    }
}

/// A server-sent event frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Reads `text/event-stream` frames off a response body.
pub struct EventStream {
    body: BodyDataStream,
    buffer: String,
}

impl EventStream {
    /// The next frame carrying data, skipping keep-alive comments.
    ///
    /// # Panics
    ///
    /// Panics if no frame arrives within five seconds or the stream ends.
    #[allow(clippy::expect_used)]
    pub async fn next_frame(&mut self) -> SseFrame {
        loop {
            if let Some((raw, rest)) = self.buffer.split_once("\n\n") {
                let frame = parse_frame(raw);
                self.buffer = rest.to_string();
                if let Some(frame) = frame {
                    return frame;
                }
                continue;
            }

            let chunk = tokio::time::timeout(Duration::from_secs(5), self.body.next())
                .await
                .expect("Timed out waiting for an event")
                .expect("Event stream ended")
                .expect("Event stream failed");
            self.buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    }
}

fn parse_frame(raw: &str) -> Option<SseFrame> {
    let mut event = String::from("message");
    let mut data: Vec<&str> = Vec::new();

    for line in raw.lines() {
        if let Some(value) = line.strip_prefix("event:") {
            event = value.trim_start().to_string();
        } else if let Some(value) = line.strip_prefix("data:") {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }

    if data.is_empty() {
        return None;
    }
    Some(SseFrame {
        event,
        data: data.join("\n"),
    })
}
