//! Credential sources backed by cookie storage.

pub mod cookie;

pub use cookie::{ACCESS_TOKEN_COOKIE, CookieFile, CookieString, find_cookie};
