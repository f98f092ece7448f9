//! Request-side authentication: token location, the middleware, extractors,
//! login/refresh/logout handlers and the hooks applications plug in.

mod cookie;
mod errors;
mod extractors;
mod handlers;
mod lookup;
mod policy;
mod responder;
mod surface;
mod types;

pub use cookie::{CookieSettings, DEFAULT_COOKIE_NAME, SameSite, get_cookie};
pub use extractors::{Authenticated, MaybeAuthenticated, authenticate_request, require_auth};
pub use handlers::{LOGIN_BODY_LIMIT, login_handler, logout_handler, refresh_handler};
pub use lookup::{DEFAULT_TOKEN_LOOKUP, TokenLookup, TokenSource};
pub use policy::{AuthPolicy, Identity, LoginAttempt};
pub use responder::{JsonResponder, Responder};
pub(crate) use responder::reject_with;
pub use surface::{FORM_BODY_LIMIT, HttpSurface, RequestSurface};
pub use types::{AuthContext, AuthFailure};
