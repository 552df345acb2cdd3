//! Side-effecting operations: approval markers, process execution, and
//! the HTTP completion client.

pub mod approval;
pub mod exec;
pub mod llm;
pub mod process;
