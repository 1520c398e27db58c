pub mod company;
pub mod handlers;
pub mod repo;
