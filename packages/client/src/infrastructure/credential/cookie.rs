//! `access_token` cookie lookup.
//!
//! Two stores are supported: a `Cookie:` header style string
//! (`a=1; access_token=...`) and a cookie file, which may hold either such a
//! string or a Netscape cookie jar as written by `curl -c`.

use std::path::PathBuf;

use crate::domain::{Credential, CredentialSource};

/// Name of the cookie holding the bearer token.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Find the value of cookie `name` in a `Cookie:` header style string.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key.trim() == name).then(|| value.trim().trim_matches('"'))
    })
}

fn credential_from(value: Option<&str>) -> Option<Credential> {
    value.and_then(|token| Credential::new(token).ok())
}

/// Cookie string fixed at startup (e.g. from `--cookie`).
#[derive(Clone)]
pub struct CookieString {
    cookies: String,
}

impl CookieString {
    pub fn new(cookies: impl Into<String>) -> Self {
        Self {
            cookies: cookies.into(),
        }
    }
}

impl CredentialSource for CookieString {
    fn read(&self) -> Option<Credential> {
        credential_from(find_cookie(&self.cookies, ACCESS_TOKEN_COOKIE))
    }
}

/// Cookie file re-read on every connection attempt.
#[derive(Debug, Clone)]
pub struct CookieFile {
    path: PathBuf,
}

impl CookieFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn lookup(contents: &str) -> Option<&str> {
        contents.lines().find_map(|line| {
            let line = line.trim_end_matches('\r');
            let line = line.strip_prefix("#HttpOnly_").unwrap_or(line);
            if line.trim().is_empty() || line.starts_with('#') {
                return None;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() == 7 {
                return (fields[5] == ACCESS_TOKEN_COOKIE).then(|| fields[6].trim());
            }
            find_cookie(line, ACCESS_TOKEN_COOKIE)
        })
    }
}

impl CredentialSource for CookieFile {
    fn read(&self) -> Option<Credential> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => credential_from(Self::lookup(&contents)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "Failed to read cookie file: {}", e);
                None
            }
        }
    }
}
