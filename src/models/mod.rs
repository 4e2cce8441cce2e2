pub mod activity;
pub mod booking;
pub mod order;
pub mod product;
pub mod user;
