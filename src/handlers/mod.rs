// handlers/mod.rs - Internal API routes
//
// Every route mirrors the backend contract under /api and forwards to it:
// Public (no token) → Protected (bearer token, role checked per route)
pub mod proxy;
pub mod protected; // Bearer token required; mutations need the Admin role
pub mod public;    // No authentication required (login, registration)
