pub mod activity_cmd;
pub mod auth_cmd;
pub mod booking_cmd;
pub mod order_cmd;
pub mod product_cmd;
pub mod report_cmd;
