use sha2::{Digest, Sha512};
use shop_types::ports::session_store::SessionId;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies, Key};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "shop_session";

/// Signing key for the session cookie, stretched from a secret of any length.
pub fn cookie_key(secret: &str) -> Key {
    let digest = Sha512::digest(secret.as_bytes());
    Key::from(digest.as_slice())
}

/// The visitor's session id, minting and setting a fresh one when the cookie
/// is absent or its signature does not verify.
pub fn session_id(cookies: &Cookies, key: &Key, secure: bool) -> SessionId {
    let signed = cookies.signed(key);
    if let Some(id) = signed
        .get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
    {
        return id;
    }

    let id = Uuid::new_v4();
    let mut cookie = Cookie::new(SESSION_COOKIE, id.to_string());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    signed.add(cookie);
    tracing::debug!(session = %id, "new session");
    id
}
