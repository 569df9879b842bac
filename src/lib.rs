pub mod bot;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod i18n;
pub mod models;
pub mod routes;
pub mod state;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;
