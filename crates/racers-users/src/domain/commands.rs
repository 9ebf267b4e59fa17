//! Commands for the Users context.
//!
//! Commands carry unvalidated primitives; the service turns them into value
//! objects.

/// Command to register a user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Requested user id, canonical UUID form.
    pub id: String,
    /// Display name.
    pub name: String,
}
