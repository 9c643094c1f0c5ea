//! # Sample stream example
//!
//! Connects to a line-delimited JSON streaming endpoint, prints statuses and
//! counts everything else until Ctrl-C.
//!
//! - `FIREHOSE_URL`: endpoint (default `http://127.0.0.1:8080/sample.json`)
//! - `FIREHOSE_AUTH`: optional `Authorization` header value
//! - `FIREHOSE_TRACK`: optional comma-separated keywords (sent as a POST body)
//! - `RUST_LOG`: log filter (default `info,firehose=debug`)
//!
//! ## Run
//! ```bash
//! FIREHOSE_URL=https://stream.example.com/1.1/statuses/filter.json \
//! FIREHOSE_TRACK=rust,tokio \
//! cargo run --example sample_stream
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use firehose::{
    Config, ConnectionRequest, DeletionNotice, EventKind, HttpStreamFactory, Listener,
    StallWarning, Status, StreamBuilder,
};
use tracing_subscriber::EnvFilter;

#[derive(Default)]
struct Printer {
    statuses: AtomicU64,
    deletes: AtomicU64,
    withheld: AtomicU64,
}

impl Printer {
    fn print_stats(&self) {
        println!();
        println!("Totals:");
        println!(" ├─► Statuses: {}", self.statuses.load(Ordering::Relaxed));
        println!(" ├─► Deletes:  {}", self.deletes.load(Ordering::Relaxed));
        println!(" └─► Withheld: {}", self.withheld.load(Ordering::Relaxed));
    }
}

#[async_trait]
impl Listener for Printer {
    async fn on_status(&self, status: &Status) {
        self.statuses.fetch_add(1, Ordering::Relaxed);
        let author = status
            .user
            .as_ref()
            .map(|u| u.screen_name.as_str())
            .unwrap_or("?");
        println!("@{author}: {}", status.text);
    }

    async fn on_delete(&self, _notice: &DeletionNotice) {
        self.deletes.fetch_add(1, Ordering::Relaxed);
    }

    async fn on_track_limit(&self, undelivered: u64) {
        self.withheld.store(undelivered, Ordering::Relaxed);
    }

    async fn on_stall_warning(&self, warning: &StallWarning) {
        println!("[warning] {} ({}% full)", warning.message, warning.percent_full);
    }

    fn name(&self) -> &'static str {
        "printer"
    }
}

fn request_from_env() -> ConnectionRequest {
    let url = std::env::var("FIREHOSE_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:8080/sample.json".to_string());
    let mut request = match std::env::var("FIREHOSE_TRACK") {
        Ok(track) => ConnectionRequest::post(url, format!("track={track}"))
            .with_header("Content-Type", "application/x-www-form-urlencoded"),
        Err(_) => ConnectionRequest::get(url),
    };
    if let Ok(auth) = std::env::var("FIREHOSE_AUTH") {
        request = request.with_header("Authorization", auth);
    }
    request
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,firehose=debug")),
        )
        .init();

    let cfg = Config::default();
    let factory = Arc::new(HttpStreamFactory::new(&cfg)?);
    let printer = Arc::new(Printer::default());

    let (stream, mut events) = StreamBuilder::new(factory, request_from_env())
        .with_config(cfg)
        .listener(printer.clone())
        .open_subscribed();

    tokio::spawn(async move {
        while let Ok(ev) = events.recv().await {
            match ev.kind {
                EventKind::BackoffScheduled => println!(
                    "[backoff] retry in {:?} ({})",
                    ev.delay().unwrap_or_default(),
                    ev.reason.as_deref().unwrap_or("unknown fault")
                ),
                EventKind::Connected => println!("[connected] attempt {}", ev.attempt.unwrap_or(0)),
                EventKind::Closed => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => stream.close(),
        _ = stream.closed() => {}
    }
    let reason = stream.closed().await;
    println!("stream closed: {reason:?}");
    printer.print_stats();
    Ok(())
}
