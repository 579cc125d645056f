//! Convenience re-exports.
//!
//! ```rust
//! use runagent::prelude::*;
//! ```

pub use crate::client::{RunAgentClient, RunAgentClientBuilder};
pub use crate::error::{Error, ResultExt};
pub use crate::error_code::ErrorKind;
pub use crate::normalize::AgentStream;
pub use crate::types::{arg, args, kw, kws, record, ArgToken, RunInput};
pub use crate::Result;
pub use tokio_util::sync::CancellationToken;
