//! 传输层：同步 HTTP 调用与流式 WebSocket 连接的抽象接口及默认实现。
//!
//! Transport seams.
//!
//! The client talks to the network only through [`HttpTransport`] and
//! [`StreamConnector`], so normalization and guardrails can be exercised with
//! in-memory doubles.

pub mod http;
pub mod ws;

pub use http::{HttpMethod, HttpReply, HttpRequest, HttpTransport, ReqwestTransport};
pub use ws::{FrameConnection, StreamConnector, WsConnector};
