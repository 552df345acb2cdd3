//! Turn orchestration loop for a single autonomous command-running agent.
//!
//! One invocation turns a user instruction into a bounded conversation
//! with a completion endpoint: each turn the model's response is parsed
//! for a command request, risky commands are gated behind out-of-band
//! operator approval, approved commands run in the scratch workspace,
//! and the captured output is fed back as the next user message. The
//! loop ends when the model stops requesting actions or the turn budget
//! is exhausted.
//!
//! The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (message log, protocol
//!   parsing, danger classification). No I/O, fully testable in
//!   isolation.
//! - **[`io`]**: Side-effecting operations (approval markers, process
//!   execution, the HTTP completion client). Isolated to enable
//!   scripting in tests.
//!
//! [`turn`] composes core logic with I/O into the loop; [`config`]
//! carries every path, toggle, and ceiling, resolved once at process
//! entry and passed by reference.

pub mod config;
pub mod core;
pub mod io;
pub mod logging;
pub mod prompt;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod turn;
