pub mod amount;
pub mod auditor;
pub mod customer;
pub mod description;
pub mod duplicate;
pub mod isolation_forest;
pub mod multi_feature;

pub use auditor::InvoiceAuditor;
pub use isolation_forest::{ForestParams, IsolationForest};
