//! 类型模块：请求载荷、流式帧与智能体架构描述。
//!
//! # Types Module
//!
//! Plain data types shared by the normalizers and the client.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`RunInput`] | Positional + named arguments for one invocation |
//! | [`ArgToken`] | Caller-side argument tokens reduced into a `RunInput` |
//! | [`RunRequest`] | Wire body of a run call / stream handshake |
//! | [`StreamFrame`] | One message received on a stream |
//! | [`AgentArchitecture`] | Entrypoint listing of an agent |

pub mod architecture;
pub mod frame;
pub mod input;

pub use architecture::{AgentArchitecture, EntryPoint};
pub use frame::{FrameKind, StreamFrame};
pub use input::{arg, args, kw, kws, record, ArgToken, RunInput, RunRequest};
