pub mod credential;
pub mod refresher;
pub mod store;
