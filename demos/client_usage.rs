//! Remote client usage: architecture lookup, payload tokens, and the
//! opt-in abort path for scripts.
//!
//! Requires `RUNAGENT_API_KEY` (or `~/.runagent/user_data.json`).

use runagent::prelude::*;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct Query {
    message: String,
    max_tokens: u32,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let agent_id = std::env::var("RUNAGENT_AGENT_ID")
        .unwrap_or_else(|_| "841debad-7433-46ae-a0ec-0540d0df7314".to_string());

    let client = RunAgentClient::builder(agent_id.as_str(), "generic")
        .observer(Arc::new(runagent::TracingObserver))
        .build()?;

    match client.validate_entrypoint().await {
        Ok(arch) => println!("Entrypoints: {}", arch.tags().join(", ")),
        Err(e) => eprintln!("{}", e.friendly()),
    }

    let query = Query {
        message: "What is the capital of France?".into(),
        max_tokens: 64,
    };
    let result = client
        .run_tokens([record(&query)?, kw("temperature", json!(0.2))])
        .await;
    match result {
        Ok(value) => println!("Result: {}", value),
        Err(e) if e.kind == ErrorKind::Authentication => {
            eprintln!("Set RUNAGENT_API_KEY first: {}", e)
        }
        Err(e) => eprintln!("{}", e.friendly()),
    }

    // Script-style: abort with a friendly message on any error.
    let value = client
        .run(RunInput::new().kw("message", "Hello"))
        .await
        .or_abort();
    println!("Result: {}", value);
    Ok(())
}
