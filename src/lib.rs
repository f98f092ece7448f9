pub mod auth;
pub mod claims;
pub mod cli;
pub mod config;
pub mod demo;
pub mod error;
pub mod gate;
pub mod jwt;
pub mod keys;
pub mod refresh;

pub use claims::Claims;
pub use config::{Clock, GateConfig, GateOptions};
pub use error::{AuthError, AuthErrorKind, ConfigError};
pub use gate::{GateBuilder, JwtGate};
pub use jwt::IssuedToken;
pub use keys::{KeyPair, KeyResolver, KeyStrategy};
pub use refresh::RefreshMode;

use auth::{
    AuthPolicy, Authenticated, login_handler, logout_handler, refresh_handler, require_auth,
};
use axum::{
    Json, Router, middleware,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the application router for a gate.
///
/// - POST `/login`, POST `/logout` and GET/POST `/refresh_token` are public.
/// - Everything under `/auth` sits behind [`require_auth`].
pub fn create_app<P: AuthPolicy>(gate: Arc<JwtGate<P>>) -> Router {
    let protected = Router::new()
        .route("/auth/hello", get(hello_handler))
        .route_layer(middleware::from_fn_with_state(
            gate.clone(),
            require_auth::<P>,
        ));

    Router::new()
        .route("/login", post(login_handler::<P>))
        .route("/logout", post(logout_handler::<P>))
        .route(
            "/refresh_token",
            get(refresh_handler::<P>).post(refresh_handler::<P>),
        )
        .merge(protected)
        .with_state(gate)
}

async fn hello_handler(Authenticated(context): Authenticated) -> Json<Value> {
    Json(json!({
        "identity": context.identity,
        "text": "Hello World.",
    }))
}

/// Serve `app` on an already bound listener until the server fails.
pub async fn run_server(listener: TcpListener, app: Router) -> std::io::Result<()> {
    axum::serve(listener, app).await
}
