pub mod handler;
pub mod registry;
