//! # runagent
//!
//! RunAgent 智能体调用客户端：统一同步调用与流式调用，归一化多种响应信封并提供统一错误分类。
//!
//! Client library for invoking RunAgent agents, hosted or deployed locally.
//!
//! ## Overview
//!
//! Agents answer with loosely structured, versioned payloads; several legacy
//! envelope layouts coexist. This crate reduces every response to one of:
//!
//! - a single logical result value ([`RunAgentClient::run`]),
//! - a sequence of content chunks ending in a completion signal
//!   ([`RunAgentClient::run_stream`] → [`AgentStream`]),
//! - a typed [`Error`] from a closed taxonomy ([`ErrorKind`]).
//!
//! Nothing is retried; each logical call is exactly one attempt.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use runagent::prelude::*;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> runagent::Result<()> {
//!     let client = RunAgentClient::builder("my-agent-id", "generic")
//!         .api_key("your-api-key")
//!         .build()?;
//!
//!     let value = client
//!         .run(RunInput::new().kw("message", "hello"))
//!         .await?;
//!     println!("{}", value);
//!
//!     let stream_client = RunAgentClient::builder("my-agent-id", "generic_stream")
//!         .api_key("your-api-key")
//!         .build()?;
//!     let mut stream = stream_client
//!         .run_stream(RunInput::new().kw("message", json!("hello")))
//!         .await?;
//!     while let Some(chunk) = stream.next().await? {
//!         print!("{}", chunk);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client façade, builder and entrypoint guardrails |
//! | [`normalize`] | Response and stream normalization engine |
//! | [`classify`] | Error classifier and suggestion enrichment |
//! | [`types`] | Run input, payload tokens, frames, architecture |
//! | [`resolver`] | REST / streaming endpoint resolution |
//! | [`config`] | Environment snapshot, user config file, constants |
//! | [`registry`] | Local agent registry |
//! | [`transport`] | HTTP and WebSocket transport seams |
//! | [`telemetry`] | Injectable observability hook |

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod error_code;
pub mod normalize;
pub mod prelude;
pub mod registry;
pub mod resolver;
pub mod telemetry;
pub mod transport;
pub mod types;

pub use client::{is_stream_entrypoint, RunAgentClient, RunAgentClientBuilder};
pub use error::{Error, ResultExt};
pub use error_code::{codes, ErrorKind};
pub use normalize::{AgentStream, StreamState};
pub use telemetry::{NoopObserver, RunObserver, TracingObserver};
pub use types::{
    arg, args, kw, kws, record, AgentArchitecture, ArgToken, EntryPoint, RunInput,
};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A pinned, boxed, sendable stream.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;
