// handlers/protected/mod.rs - Endpoints behind `require_session`
//
// Reads are open to any signed-in role. Creating, updating and deleting
// articles or categories requires Admin.
pub mod articles;
pub mod auth;
pub mod categories;
