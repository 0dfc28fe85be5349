//! Streaming execution example: command output goes to a sink as it
//! arrives instead of being captured.
//!
//! With `--json` each increment is published as a `{"contents": ...}`
//! record on an in-process channel and printed from a consumer task,
//! the shape a message bus subscriber would see.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example streaming -- --host localhost --user admin --password secret -c "ping -c 4 127.0.0.1"
//! ```

use std::env;
use std::path::PathBuf;

use sshtap::{AuthMethod, BusSink, ConsoleSink, Session, SshConfig, SshTransport, TimeBudget};
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let auth = if let Some(password) = &args.password {
        AuthMethod::Password(password.clone())
    } else if let Some(path) = &args.key {
        AuthMethod::PrivateKey {
            path: path.clone(),
            passphrase: None,
        }
    } else {
        eprintln!("Error: Must provide either --password or --key");
        std::process::exit(1);
    };

    println!("Connecting to {}:{}...", args.host, args.port);

    let mut config = SshConfig::new(&args.host, &args.user, auth);
    config.port = args.port;
    let transport = SshTransport::connect(config).await?;

    let mut session = Session::with_defaults(transport)?;
    session.prepare().await?;

    let command = args.command.as_deref().unwrap_or("ls -la /");
    let budget = TimeBudget::from_secs(args.timeout as i64);
    println!("Streaming: {}", command);
    println!("{}", "-".repeat(50));

    let response = if args.json {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let printer = tokio::spawn(async move {
            while let Some(record) = rx.recv().await {
                println!("{}", record);
            }
        });

        let mut sink = BusSink::new(tx);
        let response = session
            .execute_streaming(command, budget, &mut sink)
            .await?;
        drop(sink);
        printer.await?;
        response
    } else {
        let mut sink = ConsoleSink::new();
        session
            .execute_streaming(command, budget, &mut sink)
            .await?
    };

    println!("{}", "-".repeat(50));
    println!(
        "Status: {:?} (elapsed {:?})",
        response.status, response.elapsed
    );

    session.close().await?;
    Ok(())
}

struct Args {
    host: String,
    port: u16,
    user: String,
    password: Option<String>,
    key: Option<PathBuf>,
    timeout: u64,
    command: Option<String>,
    json: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut host = "localhost".to_string();
        let mut port = 22u16;
        let mut user = env::var("USER").unwrap_or_else(|_| "root".to_string());
        let mut password = None;
        let mut key = None;
        let mut timeout = 30u64;
        let mut command = None;
        let mut json = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    i += 1;
                    if i < args.len() {
                        host = args[i].clone();
                    }
                }
                "--port" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        port = args[i].parse().unwrap_or(22);
                    }
                }
                "--user" | "-u" => {
                    i += 1;
                    if i < args.len() {
                        user = args[i].clone();
                    }
                }
                "--password" | "-P" => {
                    i += 1;
                    if i < args.len() {
                        password = Some(args[i].clone());
                    }
                }
                "--key" | "-k" => {
                    i += 1;
                    if i < args.len() {
                        key = Some(PathBuf::from(&args[i]));
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().unwrap_or(30);
                    }
                }
                "--command" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        command = Some(args[i].clone());
                    }
                }
                "--json" | "-j" => {
                    json = true;
                }
                _ => {}
            }
            i += 1;
        }

        Self {
            host,
            port,
            user,
            password,
            key,
            timeout,
            command,
            json,
        }
    }
}
