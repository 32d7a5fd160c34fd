use axum_extra::extract::cookie::{Cookie, SameSite, SignedCookieJar};

/// Cookie holding the logged-in username, signed with the configured secret.
pub const SESSION_COOKIE: &str = "pairchat_session";

pub fn current_user(jar: &SignedCookieJar) -> Option<String> {
    jar.get(SESSION_COOKIE).map(|c| c.value().to_string())
}

pub fn sign_in(jar: SignedCookieJar, username: &str) -> SignedCookieJar {
    let cookie = Cookie::build((SESSION_COOKIE, username.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    jar.add(cookie)
}

pub fn sign_out(jar: SignedCookieJar) -> SignedCookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}
