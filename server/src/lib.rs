pub extern crate actix_web;

pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod rtc;
pub mod server;
pub mod server_state;
