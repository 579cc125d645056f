//! Basic synchronous call against a locally deployed agent.
//!
//! Run with: `RUST_LOG=runagent=debug cargo run --example basic`

use runagent::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = RunAgentClient::builder("841debad-7433-46ae-a0ec-0540d0df7314", "minimal")
        .local(true)
        .host("localhost")
        .port(8450)
        .build()?;

    let value = client
        .run(
            RunInput::new()
                .kw("role", "user")
                .kw("message", "Summarize the benefits of remote work in one paragraph"),
        )
        .await;

    match value {
        Ok(value) => println!("✅ Result: {}", value),
        Err(e) => {
            eprintln!("❌ {}", e.friendly());
            std::process::exit(1);
        }
    }
    Ok(())
}
