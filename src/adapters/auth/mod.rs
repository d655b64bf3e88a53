//! Authentication adapters.
//!
//! Implementations of the `SessionValidator` port:
//!
//! - `jwt` - HS256 session tokens signed by the login flow
//! - `mock` - Test implementation that maps fixed tokens to identities

mod jwt;
mod mock;

pub use jwt::{JwtSessionValidator, JwtValidatorConfig};
pub use mock::MockSessionValidator;
