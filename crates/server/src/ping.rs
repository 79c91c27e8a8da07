//! Health check.

use std::net::SocketAddr;

use api_types::ping::Pong;
use axum::{
    Json,
    extract::{ConnectInfo, Request},
};

/// Echo the caller's address, preferring the proxy-supplied one.
pub async fn ping(request: Request) -> Json<Pong> {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string());
    let ip = forwarded.or_else(|| {
        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
    });

    Json(Pong {
        text: "Pong".to_string(),
        ip,
    })
}
