// handlers/elevated/mod.rs - Elevated handlers (scheduled jobs)
//
// Authorised by the shared cron secret instead of a user JWT.

pub mod system; // /api/system/*
