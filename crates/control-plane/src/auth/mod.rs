// Identity for API requests
//
// Login flows live outside this service. Requests carry a signed JWT (Bearer
// header or `access_token` cookie) whose claims name the user and role.

pub mod config;
pub mod jwt;
pub mod middleware;

pub use config::{AuthConfig, AuthMode, JwtConfig};
pub use jwt::{Claims, JwtService};
pub use middleware::{AdminUser, AuthError, AuthState, AuthUser, FromRef, ACCESS_TOKEN_COOKIE};
