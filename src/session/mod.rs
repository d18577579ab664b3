pub mod auth;
pub mod credential;
pub mod interface;
pub mod manager;
