pub mod aging;
pub mod approval;
pub mod export;
pub mod matcher;

pub use approval::MatchApprovalWorkflow;
