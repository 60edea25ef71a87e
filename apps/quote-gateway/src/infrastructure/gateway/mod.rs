//! Client-facing HTTP and WebSocket gateway.
//!
//! # Routes
//!
//! - `GET /` - service banner
//! - `GET /history/{ticker}?period=&interval=` - close-price series
//! - `GET /quote/{ticker}` - latest quote snapshot
//! - `GET /search?q=` - asset search
//! - `GET /ws/{ticker}` - live quote stream (WebSocket)

pub mod error;
pub mod server;
pub mod websocket;

pub use error::{ApiError, ApiErrorResponse};
pub use server::{
    GatewayServer, GatewayServerError, GatewayState, HistoryQuery, RootResponse, SERVICE_NAME,
    SearchQuery, create_router,
};
