//! Cart route handlers.
//!
//! The local cart lives in the session and answers every shopper-facing
//! request. After each local mutation the corresponding change is mirrored
//! into the shopper's external cart best-effort: a sync failure is logged
//! and the response is built from the local cart regardless.

use std::collections::HashMap;
use std::time::Duration;

use axum::{
    Form, Json,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use cookie::Cookie;
use openkart_core::Money;
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::commerce::CommerceCartApi;
use crate::error::{AppError, Result};
use crate::models::{CurrentUser, LocalCart, session_keys};
use crate::state::AppState;
use crate::sync::{
    CartCookies, CartLinkLookup, CartSyncCoordinator, LineItemMutation, ShopperIdentity, identity,
};

// =============================================================================
// Browser Cookies
// =============================================================================

/// The request's cookies plus any writes made while handling it.
///
/// Reads come from the `Cookie` header; writes are collected and appended
/// to the response as `Set-Cookie` headers once the handler is done.
pub struct BrowserCookies {
    incoming: HashMap<String, String>,
    pending: Vec<Cookie<'static>>,
    secure: bool,
}

impl BrowserCookies {
    /// Parse the request's `Cookie` headers.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap, secure: bool) -> Self {
        let mut incoming = HashMap::new();
        for value in headers.get_all(header::COOKIE) {
            if let Ok(raw) = value.to_str() {
                for cookie in Cookie::split_parse(raw.to_owned()).flatten() {
                    incoming.insert(cookie.name().to_owned(), cookie.value().to_owned());
                }
            }
        }

        Self {
            incoming,
            pending: Vec::new(),
            secure,
        }
    }

    /// Append the pending writes to a response as `Set-Cookie` headers.
    pub fn apply(self, response: &mut Response) {
        for cookie in self.pending {
            if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
    }
}

impl CartCookies for BrowserCookies {
    fn get(&self, name: &str) -> Option<String> {
        // Writes made earlier in this request win over the incoming header.
        self.pending
            .iter()
            .rev()
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value().to_owned())
            .or_else(|| self.incoming.get(name).cloned())
    }

    fn set(&mut self, name: &str, value: &str, max_age: Duration) {
        let seconds = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        let cookie = Cookie::build((name.to_owned(), value.to_owned()))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(cookie::SameSite::Lax)
            .max_age(cookie::time::Duration::seconds(seconds))
            .build();
        self.pending.push(cookie);
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Read the local cart from the session, defaulting to an empty one.
async fn get_local_cart(session: &Session) -> Result<LocalCart> {
    Ok(session
        .get::<LocalCart>(session_keys::LOCAL_CART)
        .await?
        .unwrap_or_default())
}

/// Save the local cart back to the session.
async fn save_local_cart(session: &Session, cart: &LocalCart) -> Result<()> {
    session.insert(session_keys::LOCAL_CART, cart).await?;
    Ok(())
}

/// Derive the shopper identity for the current request.
///
/// A logged-in customer comes from the session; otherwise the anonymous
/// token is taken from the marker cookie, or freshly generated when this is
/// the shopper's first cart interaction.
async fn shopper_identity(session: &Session, cookies: &BrowserCookies) -> ShopperIdentity {
    if let Ok(Some(user)) = session.get::<CurrentUser>(session_keys::CURRENT_USER).await {
        return ShopperIdentity::Authenticated { email: user.email };
    }

    let session_token = cookies
        .get(identity::ANONYMOUS_MARKER_COOKIE)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    ShopperIdentity::Anonymous { session_token }
}

// =============================================================================
// Forms
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub sku: String,
    pub name: String,
    /// Per-unit price in major units (e.g., "4.99").
    pub price: Decimal,
    pub quantity: Option<i64>,
}

/// Update cart form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub sku: String,
    pub quantity: i64,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub sku: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the local cart.
#[instrument(skip(session))]
pub async fn show(session: Session) -> Result<Json<LocalCart>> {
    Ok(Json(get_local_cart(&session).await?))
}

/// Add an item to the cart.
///
/// The local cart is mutated and saved first; the external mirror runs
/// afterwards and cannot affect the outcome.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = form.quantity.unwrap_or(1);
    if quantity < 1 {
        return Err(AppError::BadRequest("quantity must be at least 1".into()));
    }
    let unit_price = Money::from_major(form.price, state.config().commerce.currency)
        .ok_or_else(|| AppError::BadRequest("price out of range".into()))?;

    let mut cart = get_local_cart(&session).await?;
    let mutation = cart.add(form.sku, form.name, unit_price, quantity);
    save_local_cart(&session, &cart).await?;

    Ok(mirror_for_request(&state, &session, &headers, mutation, cart).await)
}

/// Update an item's quantity. Quantity zero removes the item; an update for
/// a SKU not in the cart changes nothing.
#[instrument(skip(state, session, headers))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<UpdateCartForm>,
) -> Result<Response> {
    if form.quantity < 0 {
        return Err(AppError::BadRequest("quantity must not be negative".into()));
    }

    let mut cart = get_local_cart(&session).await?;
    let Some(mutation) = cart.update(&form.sku, form.quantity) else {
        return Ok(Json(cart).into_response());
    };
    save_local_cart(&session, &cart).await?;

    Ok(mirror_for_request(&state, &session, &headers, mutation, cart).await)
}

/// Remove an item from the cart.
#[instrument(skip(state, session, headers))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Response> {
    let mut cart = get_local_cart(&session).await?;
    let Some(mutation) = cart.remove(&form.sku) else {
        return Ok(Json(cart).into_response());
    };
    save_local_cart(&session, &cart).await?;

    Ok(mirror_for_request(&state, &session, &headers, mutation, cart).await)
}

/// Derive the request's identity and cookies, then mirror the mutation.
async fn mirror_for_request(
    state: &AppState,
    session: &Session,
    headers: &HeaderMap,
    mutation: LineItemMutation,
    cart: LocalCart,
) -> Response {
    let secure = state.config().base_url.starts_with("https://");
    let cookies = BrowserCookies::from_headers(headers, secure);
    let identity = shopper_identity(session, &cookies).await;

    mirror_and_respond(&state.sync_coordinator(), &identity, cookies, mutation, cart).await
}

/// Mirror a local mutation into the external cart and build the response.
///
/// The response is always the saved local cart; a sync failure only
/// produces a warning. Cookie writes made during identity resolution are
/// propagated as `Set-Cookie` headers.
async fn mirror_and_respond<C, L>(
    coordinator: &CartSyncCoordinator<C, L>,
    identity: &ShopperIdentity,
    mut cookies: BrowserCookies,
    mutation: LineItemMutation,
    cart: LocalCart,
) -> Response
where
    C: CommerceCartApi,
    L: CartLinkLookup,
{
    if let Err(error) = coordinator.sync(identity, mutation, &mut cookies).await {
        tracing::warn!(error = %error, "external cart sync failed, local cart unaffected");
    }

    let mut response = Json(cart).into_response();
    cookies.apply(&mut response);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with_cookie(raw: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(raw).expect("valid"));
        headers
    }

    #[test]
    fn test_browser_cookies_parse_incoming() {
        let headers = headers_with_cookie("anonymousID=tok-1; other=x");
        let cookies = BrowserCookies::from_headers(&headers, false);

        assert_eq!(cookies.get("anonymousID").as_deref(), Some("tok-1"));
        assert_eq!(cookies.get("other").as_deref(), Some("x"));
        assert_eq!(cookies.get("missing"), None);
    }

    #[test]
    fn test_browser_cookies_pending_write_wins_over_incoming() {
        let headers = headers_with_cookie("anonymousID=old");
        let mut cookies = BrowserCookies::from_headers(&headers, false);
        cookies.set("anonymousID", "new", Duration::from_secs(60));

        assert_eq!(cookies.get("anonymousID").as_deref(), Some("new"));
    }

    #[test]
    fn test_browser_cookies_apply_sets_headers() {
        let mut cookies = BrowserCookies::from_headers(&HeaderMap::new(), true);
        cookies.set(
            "tok-1",
            "cart-9",
            identity::CART_COOKIE_MAX_AGE,
        );

        let mut response = Response::new(axum::body::Body::empty());
        cookies.apply(&mut response);

        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .expect("set-cookie header");
        assert!(set_cookie.starts_with("tok-1=cart-9"));
        assert!(set_cookie.contains("Max-Age=2592000"));
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("Secure"));
        assert!(set_cookie.contains("Path=/"));
    }

    #[test]
    fn test_add_form_parses_decimal_price() {
        let form: AddToCartForm =
            serde_urlencoded::from_str("sku=W1&name=Widget&price=4.99&quantity=2")
                .expect("parses");
        assert_eq!(form.price, Decimal::new(499, 2));
        assert_eq!(form.quantity, Some(2));
    }

    mod mirror {
        use super::*;

        use std::result::Result;

        use axum::http::StatusCode;
        use openkart_core::{
            CartVersion, CurrencyCode, Email, ExternalCartId, Money as CoreMoney,
        };

        use crate::commerce::CommerceError;
        use crate::commerce::types::{CartAction, CreatedCart, ExternalCart};
        use crate::db::RepositoryError;
        use crate::models::LocalCartItem;
        use crate::sync::SyncSettings;

        /// A commerce service that is down for every call.
        struct DownApi;

        impl CommerceCartApi for DownApi {
            async fn fetch_cart(
                &self,
                _cart_id: &ExternalCartId,
            ) -> Result<ExternalCart, CommerceError> {
                Err(CommerceError::Api {
                    status: 500,
                    message: "service unavailable".to_string(),
                })
            }

            async fn create_anonymous_cart(
                &self,
                _currency: CurrencyCode,
                _anonymous_token: &str,
            ) -> Result<CreatedCart, CommerceError> {
                Err(CommerceError::Api {
                    status: 500,
                    message: "service unavailable".to_string(),
                })
            }

            async fn apply_action(
                &self,
                _cart_id: &ExternalCartId,
                _version: CartVersion,
                _action: CartAction,
            ) -> Result<ExternalCart, CommerceError> {
                Err(CommerceError::Api {
                    status: 500,
                    message: "service unavailable".to_string(),
                })
            }
        }

        struct MappedLinks;

        impl CartLinkLookup for MappedLinks {
            async fn find_by_email(
                &self,
                _email: &Email,
            ) -> Result<Option<ExternalCartId>, RepositoryError> {
                Ok(Some(ExternalCartId::from("abc-123")))
            }
        }

        /// A sync failure is absorbed: the response is still a 200 carrying
        /// the saved local cart, byte for byte.
        #[tokio::test]
        async fn test_sync_failure_leaves_local_cart_response_unaffected() {
            let coordinator = CartSyncCoordinator::new(
                DownApi,
                MappedLinks,
                SyncSettings {
                    currency: CurrencyCode::USD,
                    tax_category_id: "71202ac2-1f18-43e5-a821-08dd0e20a135".to_string(),
                },
            );
            let identity = ShopperIdentity::Authenticated {
                email: Email::parse("shopper@example.com").expect("valid"),
            };
            let cart = LocalCart {
                items: vec![LocalCartItem {
                    sku: "W1".to_string(),
                    name: "Widget".to_string(),
                    unit_price: CoreMoney::from_cents(500, CurrencyCode::USD),
                    quantity: 2,
                }],
            };
            let mutation = LineItemMutation::Add {
                name: "Widget".to_string(),
                slug: "W1".to_string(),
                unit_amount: 500,
                quantity: 2,
            };
            let cookies = BrowserCookies::from_headers(&HeaderMap::new(), false);

            let response =
                mirror_and_respond(&coordinator, &identity, cookies, mutation, cart.clone()).await;

            assert_eq!(response.status(), StatusCode::OK);
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .expect("body");
            let returned: LocalCart = serde_json::from_slice(&bytes).expect("valid cart JSON");
            assert_eq!(returned, cart);
        }
    }
}
