//! sharescreen: share the primary screen as an MJPEG stream
//!
//! Usage: sharescreen [ADDRESS [PORT]]
//!
//! Examples:
//!   sharescreen                      # binds to 0.0.0.0:8080
//!   sharescreen localhost            # binds to 127.0.0.1:8080
//!   sharescreen 192.168.1.10 9000    # binds to 192.168.1.10:9000
//!
//! Open http://ADDRESS:PORT/stream in a browser, or `ffplay` it.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use sharescreen::{FrameSourceFactory, MjpegServer, ServerConfig, DEFAULT_PORT};

/// Parsed command line
#[derive(Debug, PartialEq)]
struct Args {
    host: String,
    port: u16,
    /// Port argument that could not be parsed
    rejected_port: Option<String>,
}

fn parse_args(args: &[String]) -> Args {
    let host = args
        .first()
        .cloned()
        .unwrap_or_else(|| Ipv4Addr::UNSPECIFIED.to_string());

    let (port, rejected_port) = match args.get(1) {
        Some(raw) => match raw.parse::<u16>() {
            Ok(port) if port != 0 => (port, None),
            _ => (DEFAULT_PORT, Some(raw.clone())),
        },
        None => (DEFAULT_PORT, None),
    };

    Args {
        host,
        port,
        rejected_port,
    }
}

/// Resolve the bind address
///
/// Accepts `localhost`, a literal IP, or a host name.
async fn resolve_bind_addr(host: &str, port: u16) -> Option<SocketAddr> {
    if host.eq_ignore_ascii_case("localhost") {
        return Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port));
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return Some(SocketAddr::new(ip, port));
    }

    match tokio::net::lookup_host((host, port)).await {
        Ok(mut addrs) => addrs.next(),
        Err(e) => {
            tracing::debug!(host = %host, error = %e, "Host lookup failed");
            None
        }
    }
}

fn print_usage() {
    eprintln!("Usage: sharescreen [ADDRESS [PORT]]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  ADDRESS    Address to bind to (default: 0.0.0.0)");
    eprintln!("  PORT       Port to bind to (default: {})", DEFAULT_PORT);
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RUST_LOG   Log filter (default: sharescreen=info)");
}

async fn serve<F: FrameSourceFactory>(config: ServerConfig, factory: F) -> sharescreen::Result<()> {
    let server = MjpegServer::new(config, factory);
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await
}

#[cfg(feature = "screen")]
async fn run(config: ServerConfig) -> sharescreen::Result<()> {
    use sharescreen::capture::{JpegEncoder, PrimaryMonitor, ScreenFrameSource};

    let quality = config.jpeg_quality;
    let factory = move || {
        Ok::<_, sharescreen::CaptureError>(ScreenFrameSource::new(
            PrimaryMonitor::open()?,
            JpegEncoder::new(quality),
        ))
    };
    serve(config, factory).await
}

#[cfg(not(feature = "screen"))]
async fn run(config: ServerConfig) -> sharescreen::Result<()> {
    use sharescreen::capture::{JpegEncoder, ScreenFrameSource, TestPattern};

    tracing::warn!("Built without the `screen` feature, streaming a test pattern");
    let quality = config.jpeg_quality;
    let factory = move || {
        Ok::<_, sharescreen::CaptureError>(ScreenFrameSource::new(
            TestPattern::default(),
            JpegEncoder::new(quality),
        ))
    };
    serve(config, factory).await
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("sharescreen=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = parse_args(&args);
    if let Some(raw) = &args.rejected_port {
        tracing::warn!(port = %raw, "Invalid port, using {}", DEFAULT_PORT);
    }

    let Some(bind_addr) = resolve_bind_addr(&args.host, args.port).await else {
        tracing::error!(host = %args.host, "Could not resolve bind address");
        std::process::exit(1);
    };

    let config = ServerConfig::with_addr(bind_addr);
    tracing::info!(
        "Streaming at http://{}:{}{}",
        bind_addr.ip(),
        bind_addr.port(),
        config.stream_path
    );

    if let Err(e) = run(config).await {
        tracing::error!(error = %e, "Server failed");
        std::process::exit(1);
    }
}
