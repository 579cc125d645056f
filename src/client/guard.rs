//! Entrypoint guardrails.
//!
//! Checked purely on the configured tag string, before any network call.

use crate::error_code::codes;
use crate::{Error, Result};

const STREAM_ALIASES: &[&str] = &["generic_stream", "stream"];
const STREAM_SUFFIX: &str = "_stream";

/// Whether `tag` names a streaming entrypoint.
pub fn is_stream_entrypoint(tag: &str) -> bool {
    let tag = tag.trim().to_ascii_lowercase();
    STREAM_ALIASES.contains(&tag.as_str()) || tag.ends_with(STREAM_SUFFIX)
}

pub(crate) fn ensure_non_stream(tag: &str) -> Result<()> {
    if is_stream_entrypoint(tag) {
        return Err(Error::validation(format!(
            "stream entrypoint '{}' must be invoked with run_stream",
            tag
        ))
        .with_code(codes::STREAM_ENTRYPOINT)
        .with_suggestion("Use client.run_stream(...) for *_stream tags."));
    }
    Ok(())
}

pub(crate) fn ensure_stream(tag: &str) -> Result<()> {
    if !is_stream_entrypoint(tag) {
        return Err(Error::validation(format!(
            "non-stream entrypoint '{}' must be invoked with run",
            tag
        ))
        .with_code(codes::NON_STREAM_ENTRYPOINT)
        .with_suggestion("Use client.run(...) for non-stream tags."));
    }
    Ok(())
}
