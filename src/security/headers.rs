//! Header allow-lists for both directions of the proxy hop.
//!
//! # Responsibilities
//! - Declare which inbound headers may reach the backend
//! - Declare which backend headers may reach the client
//! - Extend X-Forwarded-For / X-Real-Ip with the connected peer
//!
//! # Design Decisions
//! - Allow-list, never deny-list: anything not named here is dropped
//! - Credentials (`Cookie`, `Authorization`) are not in the inbound list;
//!   the credential strategy attaches exactly one of them
//! - `Set-Cookie` is copied value by value so multiple cookies survive
//! - `Host` is never copied; the client derives it from the backend URL

use std::net::IpAddr;

use axum::http::header::{
    self, HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE,
    CACHE_CONTROL, CONTENT_ENCODING, CONTENT_TYPE, ETAG, LOCATION, SET_COOKIE, USER_AGENT,
};

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Inbound headers copied onto the outbound request.
pub const REQUEST_PASSTHROUGH: &[HeaderName] = &[
    USER_AGENT,
    ACCEPT,
    ACCEPT_LANGUAGE,
    ACCEPT_ENCODING,
    CONTENT_TYPE,
];

/// Backend headers copied onto the client response.
pub const RESPONSE_PASSTHROUGH: &[HeaderName] = &[CONTENT_TYPE, CACHE_CONTROL, ETAG, CONTENT_ENCODING];

pub fn is_request_passthrough(name: &HeaderName) -> bool {
    REQUEST_PASSTHROUGH.contains(name) || *name == X_FORWARDED_FOR || *name == X_REAL_IP
}

pub fn is_response_passthrough(name: &HeaderName) -> bool {
    RESPONSE_PASSTHROUGH.contains(name) || *name == header::SET_COOKIE
}

/// Build the outbound header set from the inbound one.
///
/// `client_ip` is the connected peer, appended to `X-Forwarded-For` and used
/// as `X-Real-Ip` when the inbound request carries none.
pub fn outbound_headers(inbound: &HeaderMap, client_ip: Option<IpAddr>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for name in REQUEST_PASSTHROUGH {
        for value in inbound.get_all(name) {
            headers.append(name.clone(), value.clone());
        }
    }

    let mut chain: Vec<String> = inbound
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if let Some(ip) = client_ip {
        chain.push(ip.to_string());
    }
    if !chain.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&chain.join(", ")) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }

    match inbound.get(&X_REAL_IP) {
        Some(value) => {
            headers.insert(X_REAL_IP, value.clone());
        }
        None => {
            if let Some(ip) = client_ip {
                if let Ok(value) = HeaderValue::from_str(&ip.to_string()) {
                    headers.insert(X_REAL_IP, value);
                }
            }
        }
    }

    headers
}

/// Build the client-facing header set from the backend response.
///
/// `Location` is only surfaced for redirect results.
pub fn response_headers(upstream: &HeaderMap, redirect: bool) -> HeaderMap {
    let mut headers = HeaderMap::new();

    for name in RESPONSE_PASSTHROUGH {
        if let Some(value) = upstream.get(name) {
            headers.insert(name.clone(), value.clone());
        }
    }

    for value in upstream.get_all(SET_COOKIE) {
        headers.append(SET_COOKIE, value.clone());
    }

    if redirect {
        if let Some(location) = upstream.get(LOCATION) {
            headers.insert(LOCATION, location.clone());
        }
    }

    headers
}
