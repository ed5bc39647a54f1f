use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use imagegen::auth::{self, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use imagegen::codec::base32;
use imagegen::utils::LoggingConfig;
use imagegen::{EnvConfig, ServiceConfig};

#[derive(Parser)]
#[command(name = "imagegen", version, about = "Image generation tool server", author)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 启动 HTTP 工具服务
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
    /// 为请求打印签名头
    Sign {
        /// 保存共享密钥的环境变量
        #[arg(long, default_value = "IMAGEGEN_HMAC_SECRET")]
        secret_env: String,
        #[arg(long, default_value = "POST")]
        method: String,
        #[arg(long)]
        path: String,
        /// 请求体；省略时从 `--body-file` 读取
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,
        #[arg(long)]
        body_file: Option<PathBuf>,
        /// Unix 秒，默认当前时间
        #[arg(long)]
        timestamp: Option<u64>,
    },
    Base32 {
        #[command(subcommand)]
        command: Base32Command,
    },
}

#[derive(Subcommand)]
enum Base32Command {
    Encode { input: String },
    Decode { input: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    LoggingConfig::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Serve { bind } => {
            let mut config = ServiceConfig::from_env()?;
            if let Some(bind) = bind {
                config.bind = bind;
            }
            imagegen::server::serve(config).await?;
        }
        Command::Sign {
            secret_env,
            method,
            path,
            body,
            body_file,
            timestamp,
        } => handle_sign(&secret_env, &method, &path, body, body_file, timestamp)?,
        Command::Base32 { command } => match command {
            Base32Command::Encode { input } => println!("{}", base32::encode(input.as_bytes())),
            Base32Command::Decode { input } => {
                let bytes = base32::decode(&input)?;
                println!("{}", String::from_utf8_lossy(&bytes));
            }
        },
    }
    Ok(())
}

fn handle_sign(
    secret_env: &str,
    method: &str,
    path: &str,
    body: Option<String>,
    body_file: Option<PathBuf>,
    timestamp: Option<u64>,
) -> anyhow::Result<()> {
    let secret = EnvConfig::get_env(secret_env)?;
    let body = match (body, body_file) {
        (Some(body), _) => body.into_bytes(),
        (None, Some(file)) => fs::read(&file)?,
        (None, None) => Vec::new(),
    };
    let timestamp = match timestamp {
        Some(ts) => ts,
        None => SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs(),
    }
    .to_string();

    let signature = auth::sign(&secret, &timestamp, &method.to_uppercase(), path, &body);
    println!("{SIGNATURE_HEADER}: {signature}");
    println!("{TIMESTAMP_HEADER}: {timestamp}");
    Ok(())
}
