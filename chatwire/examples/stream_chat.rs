//! Stream one answer from a chat server and print it as it arrives.
//!
//! Reads the bearer token from CHATWIRE_TOKEN.
//!
//! Run with:
//!
//! ```sh
//! CHATWIRE_TOKEN=... cargo run --example stream_chat -p chatwire -- \
//!     http://localhost:8080 my-app gpt-4o "Tell me a joke"
//! ```

use std::io::Write;
use std::sync::Arc;

use chatwire::prelude::*;

/// Prints each content update, overwriting the previous line.
struct Printer;

impl SessionListener for Printer {
    fn conversation_created(&self, conversation_id: &ConversationId) {
        eprintln!("[new conversation {conversation_id}]");
    }

    fn content_updated(&self, content: &str) {
        print!("\r{content}");
        let _ = std::io::stdout().flush();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let base_url = args.next().unwrap_or_else(|| "http://localhost:8080".into());
    let app_id = args.next().unwrap_or_else(|| "default".into());
    let model_id = args.next().unwrap_or_else(|| "gpt-4o".into());
    let prompt = args.next().unwrap_or_else(|| "Hello!".into());

    let source = EventSource::new(Arc::new(EnvCredentials::default())).base_url(base_url);
    let client = ChatClient::new(source);
    let transcript = Arc::new(Transcript::new());

    // Ctrl-C stops the stream and keeps what arrived so far.
    let cancel = tokio_util::sync::CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_ctrl_c.cancel();
        }
    });

    let report = client
        .submit(
            Submission::new(ChatRequest::new(app_id, model_id, prompt), transcript.clone())
                .listener(Arc::new(Printer))
                .cancel(cancel),
        )
        .await?;
    println!();

    eprintln!(
        "[{:?}{}] {} entries in transcript",
        report.state,
        if report.cancelled { ", cancelled" } else { "" },
        transcript.len().await
    );
    if let Some(error) = report.error {
        eprintln!("[error: {error}]");
    }
    Ok(())
}
