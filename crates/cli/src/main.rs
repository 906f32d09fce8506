use anyhow::Context;
use bookshop_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bookshop-cli", version, about = "Bookshop service command line")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service until interrupted
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the merged OpenAPI document
    Openapi,
    /// Print the effective settings with secrets redacted
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load().with_context(|| "failed to load bookshop settings")?;

    match cli.command {
        Command::Serve { port } => {
            bookshop_telemetry::init(&settings.telemetry)?;
            if let Some(port) = port {
                tracing::info!(
                    configured = settings.server.port,
                    port,
                    "overriding server port from command line"
                );
                settings.server.port = port;
            }
            bookshop_app::run(settings).await
        }
        Command::Openapi => {
            let registry = bookshop_app::build_registry(&settings);
            let document =
                bookshop_http::router::openapi_document(&registry, &settings.server.api_prefix);
            println!("{}", serde_json::to_string_pretty(&document)?);
            Ok(())
        }
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&settings.redacted())?);
            Ok(())
        }
    }
}
