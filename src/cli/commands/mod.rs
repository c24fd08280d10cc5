pub mod auth;
pub mod db;
pub mod tokens;
pub mod zipcodes;
