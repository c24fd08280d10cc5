// handlers/public/mod.rs - Public handlers (no authentication)

pub mod health; // GET /health, GET /api/health
pub mod root; // GET /

pub use health::health;
pub use root::root;
