//! End-to-end tests for the SpiceHub storefront.
//!
//! The storefront router is driven in-process with an in-memory session
//! store, so no server or database is needed:
//!
//! ```bash
//! cargo test -p spicehub-integration-tests
//! ```
//!
//! [`Shopper`] plays one browser: it keeps the session cookie between
//! requests the way a cookie jar would.

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{HeaderMap, Request, StatusCode, header};
use tower::ServiceExt;
use tower_sessions::MemoryStore;

use spicehub_storefront::config::StorefrontConfig;
use spicehub_storefront::db::OrderRepository;
use spicehub_storefront::state::AppState;

const SESSION_COOKIE: &str = "spicehub_session";
const BODY_LIMIT: usize = 1024 * 1024;

/// Storefront app backed by in-memory orders and sessions.
#[must_use]
pub fn app() -> Router {
    spicehub_storefront::app(AppState::in_memory(config()), MemoryStore::default())
}

/// Storefront app storing orders in `orders`.
#[must_use]
pub fn app_with_orders(orders: Arc<dyn OrderRepository>) -> Router {
    spicehub_storefront::app(
        AppState::with_orders(config(), orders),
        MemoryStore::default(),
    )
}

fn config() -> StorefrontConfig {
    StorefrontConfig::local("http://localhost:3000")
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header(header::LOCATION.as_str())
    }

    /// Whether the response tells HTMX that the cart changed.
    #[must_use]
    pub fn triggers_cart_updated(&self) -> bool {
        self.header("hx-trigger") == Some("cart-updated")
    }
}

/// One browser session against the app.
pub struct Shopper {
    app: Router,
    cookie: Option<String>,
}

impl Shopper {
    #[must_use]
    pub const fn new(app: Router) -> Self {
        Self { app, cookie: None }
    }

    pub async fn get(&mut self, uri: &str) -> TestResponse {
        let request = self.request("GET", uri).body(Body::empty());
        self.send(request.expect("valid GET request")).await
    }

    pub async fn post_form(&mut self, uri: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = fields
            .iter()
            .map(|(name, value)| {
                format!("{}={}", urlencoding::encode(name), urlencoding::encode(value))
            })
            .collect::<Vec<_>>()
            .join("&");

        let request = self
            .request("POST", uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body));
        self.send(request.expect("valid POST request")).await
    }

    /// Add `quantity` units of a product through the add-to-cart form.
    pub async fn add_to_cart(&mut self, id: &str, name: &str, price: &str, quantity: u32) {
        let quantity = quantity.to_string();
        let response = self
            .post_form(
                "/cart/add",
                &[
                    ("id", id),
                    ("name", name),
                    ("price", price),
                    ("image", "/img/spice.jpg"),
                    ("quantity", &quantity),
                ],
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "add to cart failed: {}", response.body);
    }

    fn request(&self, method: &str, uri: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let session_cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| v.split(';').next())
            .find(|pair| pair.starts_with(SESSION_COOKIE));
        if let Some(pair) = session_cookie {
            self.cookie = Some(pair.to_string());
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), BODY_LIMIT)
            .await
            .expect("readable body");
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }
}

/// Text of the first element carrying `class="{class}"`.
#[must_use]
pub fn text_of_class<'a>(html: &'a str, class: &str) -> Option<&'a str> {
    let (_, rest) = html.split_once(&format!("class=\"{class}\""))?;
    let (_, inner) = rest.split_once('>')?;
    inner.split('<').next().map(str::trim)
}
