use axum::response::Redirect;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

const FLASH_COOKIE_NAME: &str = "_flash";

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Warning,
    Error,
}

/// One-shot message shown by the next page the visitor loads.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

/// Same attributes as the session cookie.
fn flash_cookie(value: String, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(FLASH_COOKIE_NAME, value);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_secure(secure);
    cookie
}

pub fn set_flash(cookies: &Cookies, secure: bool, kind: FlashKind, message: impl Into<String>) {
    let flash = Flash {
        kind,
        message: message.into(),
    };
    match serde_json::to_vec(&flash) {
        Ok(json) => cookies.add(flash_cookie(URL_SAFE_NO_PAD.encode(json), secure)),
        Err(e) => tracing::warn!(error = %e, "flash not serializable"),
    }
}

/// Reads and clears the pending flash, if any.
pub fn take_flash(cookies: &Cookies) -> Option<Flash> {
    let raw = cookies.get(FLASH_COOKIE_NAME)?;
    cookies.remove(flash_cookie(String::new(), false));
    let bytes = URL_SAFE_NO_PAD.decode(raw.value()).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub fn redirect_with_flash(
    cookies: &Cookies,
    secure: bool,
    to: &str,
    kind: FlashKind,
    message: impl Into<String>,
) -> Redirect {
    set_flash(cookies, secure, kind, message);
    Redirect::to(to)
}
