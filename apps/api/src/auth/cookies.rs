use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

use crate::config::Config;

pub const SESSION_COOKIE: &str = "session-token";
pub const OAUTH_STATE_COOKIE: &str = "oauth_state";

const OAUTH_STATE_MAX_AGE_SECS: i64 = 600;

/// Session cookie: HTTP-only, `SameSite=Lax`, scoped to `/`, living as long
/// as the server-side session. `Secure` is set when the deployment is HTTPS.
pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(config.cookie_secure)
        .max_age(Duration::days(config.session_ttl_days))
        .build()
}

/// Short-lived cookie carrying the OAuth `state` between the redirect to
/// Google and the callback.
pub fn oauth_state_cookie(state: String, config: &Config) -> Cookie<'static> {
    Cookie::build((OAUTH_STATE_COOKIE, state))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(config.cookie_secure)
        .max_age(Duration::seconds(OAUTH_STATE_MAX_AGE_SECS))
        .build()
}

/// Cookie handed to `CookieJar::remove`; the path must match the one it was set with.
pub fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}
