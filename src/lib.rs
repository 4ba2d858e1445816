pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod routes;
pub mod services;
pub mod storage;
pub mod utils;

#[cfg(test)]
mod testing;
