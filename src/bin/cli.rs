//! Chat Hub CLI
//!
//! Console client for the chat hub server:
//! - Join the chat interactively
//! - Exercise the demo call patterns
//! - Check server status
//! - Stress test the unary endpoint

use anyhow::{bail, Context, Result};
use chathub::api::dto::{HealthResponse, ServerInfoResponse};
use chathub::demo::{StreamingRequest, StreamingResponse, UnaryRequest, UnaryResponse, UploadFrame};
use chathub::hub::{ChatMessage, ClientMessage, MessageKind};
use clap::{Parser, Subcommand};
use futures_util::{SinkExt, StreamExt};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::tungstenite::Message;

#[derive(Parser)]
#[command(name = "chathub-cli")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Console client for the chat hub server")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Server URL
    #[arg(long, default_value = "http://127.0.0.1:5003", global = true)]
    pub url: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Join the chat room (type `exit` or an empty line to leave)
    Chat {
        /// Name shown on your messages (default: random ChatUser-NNNN)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Send one unary request
    Unary {
        message: String,
    },

    /// Watch a server stream
    Stream {
        #[arg(default_value = "Monitor Request")]
        message: String,
    },

    /// Upload several messages as one client stream
    Upload {
        #[arg(required = true)]
        messages: Vec<String>,
    },

    /// Echo messages over a bidirectional stream
    Echo {
        #[arg(required = true)]
        messages: Vec<String>,
    },

    /// Show server information
    Info,

    /// Show server health
    Status,

    /// Send many concurrent unary requests and report timing
    Stress {
        /// Number of concurrent requests
        #[arg(short, long, default_value = "100")]
        count: usize,
        #[arg(short, long, default_value = "Stress Test")]
        message: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let base = cli.url.trim_end_matches('/').to_string();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Chat { name } => {
            let name = name.unwrap_or_else(random_client_name);
            chat(&base, &name).await?;
        }

        Commands::Unary { message } => {
            let response = unary(&client, &base, &message, &client_name()).await?;
            println!("Response: {}", response.response);
            println!("Server ID: {}", response.server_id);
            println!("Timestamp: {}", response.timestamp);
            println!("Processing time: {}ms", response.processing_time_ms);
        }

        Commands::Stream { message } => {
            stream(&client, &base, &message).await?;
        }

        Commands::Upload { messages } => {
            let response = upload(&base, &messages).await?;
            print_streaming(&response);
        }

        Commands::Echo { messages } => {
            echo(&base, &messages).await?;
        }

        Commands::Info => {
            let info: ServerInfoResponse = get_json(&client, &format!("{}/api/v1/server-info", base)).await?;

            println!("Server: {} v{}", info.server_name, info.version);
            println!("Started: {}", info.start_time);
            println!("Active connections: {}", info.active_connections);
            println!("Features:");
            for feature in info.supported_features {
                println!("  - {}", feature);
            }
        }

        Commands::Status => match get_json::<HealthResponse>(&client, &format!("{}/health", base)).await {
            Ok(health) => {
                println!("Chat hub v{}", health.version);
                println!();
                println!("Status: {}", health.status);
                println!("Hub: {}", health.hub);
                println!("Connected clients: {}", health.connected_clients);
                println!("Uptime: {}", format_duration(health.uptime_seconds));
            }
            Err(e) => {
                eprintln!("Cannot reach chat hub at {}", base);
                eprintln!("Error: {:#}", e);
                eprintln!();
                eprintln!("Make sure the server is running:");
                eprintln!("  cargo run --bin chathub");
                std::process::exit(1);
            }
        },

        Commands::Stress { count, message } => {
            stress(&client, &base, count, &message).await;
        }

        Commands::Config { output } => {
            let config = chathub::config::generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &config)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", config);
                }
            }
        }
    }

    Ok(())
}

async fn chat(base: &str, name: &str) -> Result<()> {
    let url = format!("{}/ws/chat", ws_base(base));
    let (socket, _) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .with_context(|| format!("Cannot connect to {}", url))?;
    let (mut sender, mut receiver) = socket.split();

    println!("Connected as {}. Type a message and press Enter; `exit` or an empty line quits.", name);

    let printer = tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str::<ChatMessage>(&text) {
                    Ok(msg) => print_chat(&msg),
                    Err(_) => println!("{}", text),
                },
                Ok(Message::Close(_)) | Err(_) => break,
                Ok(_) => {}
            }
        }
        println!("Disconnected from server.");
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.eq_ignore_ascii_case("exit") {
            break;
        }
        if printer.is_finished() {
            break;
        }

        let text = serde_json::to_string(&ClientMessage::new(name, line))?;
        if sender.send(Message::Text(text)).await.is_err() {
            break;
        }
    }

    let _ = sender.send(Message::Close(None)).await;
    let _ = tokio::time::timeout(Duration::from_secs(2), printer).await;
    Ok(())
}

fn print_chat(msg: &ChatMessage) {
    match msg.kind {
        MessageKind::System => println!("[{}] *** {}", msg.timestamp, msg.body),
        MessageKind::Chat => println!("[{}] {}", msg.timestamp, msg.body),
    }
}

async fn unary(
    client: &reqwest::Client,
    base: &str,
    message: &str,
    client_id: &str,
) -> Result<UnaryResponse> {
    let request = UnaryRequest {
        message: message.to_string(),
        client_id: client_id.to_string(),
        timestamp: Some(chrono::Local::now().to_rfc3339()),
    };

    let response = client
        .post(format!("{}/api/v1/unary", base))
        .json(&request)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        bail!("Unary call failed ({}): {}", status, text);
    }

    Ok(response.json().await?)
}

async fn stream(client: &reqwest::Client, base: &str, message: &str) -> Result<()> {
    let client_id = client_name();
    let response = client
        .get(format!("{}/api/v1/stream", base))
        .query(&[("message", message), ("client_id", client_id.as_str())])
        .send()
        .await?;

    if !response.status().is_success() {
        bail!("Stream request failed: {}", response.status());
    }

    println!("Monitoring server stream...");
    let mut body = response.bytes_stream();
    let mut buffer = String::new();

    while let Some(chunk) = body.next().await {
        buffer.push_str(&String::from_utf8_lossy(&chunk?));
        while let Some(end) = buffer.find("\n\n") {
            let event: String = buffer.drain(..end + 2).collect();
            if let Some(data) = sse_data(&event) {
                match serde_json::from_str::<StreamingResponse>(&data) {
                    Ok(response) => print_streaming(&response),
                    Err(e) => eprintln!("Unreadable event: {}", e),
                }
            }
        }
    }

    println!("Stream completed.");
    Ok(())
}

/// Joined `data:` lines of one SSE event
fn sse_data(event: &str) -> Option<String> {
    let lines: Vec<&str> = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

async fn upload(base: &str, messages: &[String]) -> Result<StreamingResponse> {
    let url = format!("{}/ws/client-stream", ws_base(base));
    let (mut socket, _) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .with_context(|| format!("Cannot connect to {}", url))?;

    let client_id = client_name();
    for (i, message) in messages.iter().enumerate() {
        let frame = UploadFrame::Request(StreamingRequest {
            message: message.clone(),
            sequence_number: i as u32 + 1,
            client_id: client_id.clone(),
        });
        socket.send(Message::Text(serde_json::to_string(&frame)?)).await?;
        println!("Sent: {}", message);
    }
    socket
        .send(Message::Text(serde_json::to_string(&UploadFrame::Complete)?))
        .await?;

    while let Some(frame) = socket.next().await {
        if let Message::Text(text) = frame? {
            return Ok(serde_json::from_str(&text)?);
        }
    }
    bail!("Server closed the stream without a response")
}

async fn echo(base: &str, messages: &[String]) -> Result<()> {
    let url = format!("{}/ws/bidi", ws_base(base));
    let (mut socket, _) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .with_context(|| format!("Cannot connect to {}", url))?;

    let client_id = client_name();
    for (i, message) in messages.iter().enumerate() {
        let request = StreamingRequest {
            message: message.clone(),
            sequence_number: i as u32 + 1,
            client_id: client_id.clone(),
        };
        socket.send(Message::Text(serde_json::to_string(&request)?)).await?;

        loop {
            match socket.next().await {
                Some(Ok(Message::Text(text))) => {
                    let response: StreamingResponse = serde_json::from_str(&text)?;
                    print_streaming(&response);
                    break;
                }
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e.into()),
                None => bail!("Server closed the stream"),
            }
        }
    }

    let _ = socket.close(None).await;
    Ok(())
}

async fn stress(client: &reqwest::Client, base: &str, count: usize, message: &str) {
    println!("Sending {} concurrent unary requests...", count);
    let started = Instant::now();

    let calls = (0..count).map(|i| {
        let client = client.clone();
        let message = format!("{} {}", message, i + 1);
        let base = base.to_string();
        async move {
            let call_started = Instant::now();
            let result = unary(&client, &base, &message, &format!("stress-{}", i + 1)).await;
            (result, call_started.elapsed())
        }
    });
    let results = futures_util::future::join_all(calls).await;
    let total = started.elapsed();

    let mut succeeded = 0usize;
    let mut latency = Duration::ZERO;
    for (result, elapsed) in &results {
        match result {
            Ok(_) => {
                succeeded += 1;
                latency += *elapsed;
            }
            Err(e) => eprintln!("Request failed: {:#}", e),
        }
    }

    println!();
    println!("Completed: {}/{}", succeeded, count);
    println!("Failed: {}", count - succeeded);
    println!("Total time: {}ms", total.as_millis());
    if succeeded > 0 {
        println!("Average latency: {}ms", (latency / succeeded as u32).as_millis());
        println!(
            "Throughput: {:.1} req/s",
            succeeded as f64 / total.as_secs_f64().max(f64::EPSILON)
        );
    }
}

async fn get_json<T: serde::de::DeserializeOwned>(client: &reqwest::Client, url: &str) -> Result<T> {
    let response = client.get(url).send().await?;
    if !response.status().is_success() {
        bail!("Server returned {}", response.status());
    }
    Ok(response.json().await?)
}

fn print_streaming(response: &StreamingResponse) {
    println!(
        "[{}] #{} {} (server {})",
        response.timestamp, response.sequence_number, response.response, response.server_id
    );
}

fn ws_base(base: &str) -> String {
    if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        base.to_string()
    }
}

fn client_name() -> String {
    format!("cli-{}", std::process::id())
}

fn random_client_name() -> String {
    let n = uuid::Uuid::new_v4().as_u128() % 9000 + 1000;
    format!("ChatUser-{}", n)
}

fn format_duration(seconds: u64) -> String {
    if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m {}s", seconds / 60, seconds % 60)
    } else if seconds < 86400 {
        format!("{}h {}m", seconds / 3600, (seconds % 3600) / 60)
    } else {
        format!("{}d {}h", seconds / 86400, (seconds % 86400) / 3600)
    }
}
