pub mod agent_registry;
pub mod coupon_store;
pub mod llm;
pub mod solver_auth;
pub mod task_ledger;

pub use agent_registry::AgentRegistryService;
pub use coupon_store::CouponService;
pub use llm::LlmService;
pub use task_ledger::{TaskFilter, TaskLedgerService};
