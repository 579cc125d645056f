//! Streaming call with a deadline.
//!
//! Run with: `RUST_LOG=runagent=debug cargo run --example streaming`

use runagent::prelude::*;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let client = RunAgentClient::builder("841debad-7433-46ae-a0ec-0540d0df7314", "minimal_stream")
        .local(true)
        .host("localhost")
        .port(8450)
        .build()?;

    // Cancel the stream after five minutes.
    let cancel = CancellationToken::new();
    let deadline = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(300)).await;
        deadline.cancel();
    });

    let mut stream = client
        .run_stream_with_cancel(
            RunInput::new().kw("role", "user").kw(
                "message",
                "Write a detailed analysis of remote work benefits for software development teams",
            ),
            &cancel,
        )
        .await?;

    println!("📡 Streaming response:");
    println!("----------------------------------------");
    loop {
        match stream.next().await {
            Ok(Some(chunk)) => match chunk.as_str() {
                Some(text) => print!("{}", text),
                None => print!("{}", chunk),
            },
            Ok(None) => break,
            Err(e) => {
                eprintln!("\nStream error: {}", e);
                break;
            }
        }
    }
    stream.close().await;

    println!("\n✅ Stream completed!");
    Ok(())
}
