//! Session-cookie authentication backed by Google sign-in.

pub mod cookies;
pub mod extractors;
pub mod handlers;
pub mod oauth;
pub mod session;
pub mod sweeper;
