//! Authentication and authorization for the admin API
//!
//! Provides:
//! - JWT token generation and validation
//! - The single static admin credential (plaintext or Argon2 hash)
//! - Admin roles and permission checks
//! - Request guards used by the admin routes

pub mod credentials;
pub mod guard;
pub mod jwt;
pub mod roles;

pub use credentials::{hash_password, AdminCredential};
pub use guard::{require_admin, require_permission};
pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenInput, TokenValidationResult};
pub use roles::{has_permission, AdminRole, PERMISSION_ALL, PERMISSION_BUDGET};
