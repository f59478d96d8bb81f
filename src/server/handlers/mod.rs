pub mod agents;
pub mod coupons;
pub mod dev;
pub mod tasks;
