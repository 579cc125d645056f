//! 归一化引擎：将多种历史响应信封与流式帧统一为单一值或分类错误。
//!
//! # Normalize Module
//!
//! The engine that reduces loosely structured, versioned server payloads to
//! a single logical value, a typed [`Error`](crate::Error), or a sequence of
//! content chunks.
//!
//! | Submodule | Description |
//! |-----------|-------------|
//! | [`structured`] | One-layer structured-string unwrap |
//! | [`envelope`] | Synchronous response normalizer (ordered shape matchers) |
//! | [`stream`] | Stream state machine ([`AgentStream`]) |
//! | [`architecture`] | Architecture lookup normalizer |

pub mod architecture;
pub mod envelope;
pub mod stream;
pub mod structured;


pub use architecture::normalize_architecture;
pub use envelope::{normalize_response, resolve_envelope, EnvelopeShape};
pub use stream::{AgentStream, StreamState};
pub use structured::{decode_structured_object, decode_structured_str, unwrap_payload};
