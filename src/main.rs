use anyhow::{Context, Result};
use clap::Parser;
use component_manager::{AppConfig, Manager};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "component-manager")]
#[command(about = "Ordered startup and shutdown of long-lived in-process components")]
#[command(version)]
#[command(long_about = "Starts the configured components one after another, each racing its own \
start timeout, then waits for SIGINT, SIGTERM or SIGQUIT and shuts them down in reverse order \
within a grace period.")]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "component-manager.toml",
        help = "Path to TOML configuration file"
    )]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without starting components")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting component manager v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = AppConfig::load_from_file(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config))?;

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        if args.validate_config {
            eprintln!("✗ Configuration validation failed: {}", e);
            std::process::exit(1);
        }
        return Err(e.into());
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let manager = build_manager(&config)?;
    let errors = manager.start().await;

    let exit_code = manager
        .run(errors, config.manager.grace_period())
        .await
        .context("component manager failed to shut down")?;

    info!("Component manager exited with code: {}", exit_code);
    std::process::exit(exit_code);
}

fn build_manager(config: &AppConfig) -> component_manager::Result<Manager> {
    #[allow(unused_mut)]
    let mut manager = Manager::new();

    #[cfg(feature = "http")]
    {
        let server = component_manager::HttpServer::builder()
            .config(config.server.clone())
            .build()?;
        manager.register(std::sync::Arc::new(server))?;
    }

    #[cfg(not(feature = "http"))]
    let _ = config;

    info!(
        components = ?manager.component_names(),
        "Registered components"
    );
    Ok(manager)
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Determine log level based on flags
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("component_manager={}", log_level)));

    let fmt_layer = match log_format(args.log_format.as_deref()) {
        "json" => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        "compact" => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        _ => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .try_init()
        .context("failed to initialize logging")?;

    Ok(())
}

/// Resolve the requested log format, falling back to pretty
fn log_format(requested: Option<&str>) -> &str {
    match requested {
        Some(format @ ("json" | "compact" | "pretty")) => format,
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using pretty", format);
            "pretty"
        }
        None => "pretty",
    }
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    let rendered = AppConfig::default()
        .to_toml()
        .context("failed to render default configuration")?;

    println!("# Component manager configuration");
    println!("# Every value can be overridden with COMPMGR_<SECTION>__<KEY> environment variables");
    println!();
    println!("{}", rendered);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_falls_back_to_pretty() {
        assert_eq!(log_format(Some("json")), "json");
        assert_eq!(log_format(Some("compact")), "compact");
        assert_eq!(log_format(Some("pretty")), "pretty");
        assert_eq!(log_format(Some("syslog")), "pretty");
        assert_eq!(log_format(None), "pretty");
    }
}
