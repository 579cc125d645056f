//! 客户端门面：同步调用 run 与流式调用 run_stream，以及入口点守卫。
//!
//! Client façade.
//!
//! [`RunAgentClient`] is built once through [`RunAgentClientBuilder`] and is
//! immutable afterwards; share it behind an `Arc` for concurrent calls.

pub mod builder;
pub mod core;
pub mod guard;

pub use builder::RunAgentClientBuilder;
pub use self::core::RunAgentClient;
pub use guard::is_stream_entrypoint;
