// handlers/elevated/system/mod.rs - System job handlers

pub mod replenish; // POST /api/system/replenish-tokens

pub use replenish::replenish_tokens;
