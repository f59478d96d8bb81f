pub mod agent;
pub mod coupon;
pub mod pagination;
pub mod task;

pub use agent::Agent;
pub use coupon::{Coupon, VoteDirection};
pub use pagination::{ListTasksParams, PageInfo, Pagination, TaskPage};
pub use task::{NewTask, Task};
