pub mod claims;
pub mod cookie;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod utils;

pub use claims::{Claims, TokenType};
pub use jwt::JwtService;
pub use middleware::{AuthMiddleware, AuthenticatedUser};
pub use utils::{require_admin, require_self_or_admin};
