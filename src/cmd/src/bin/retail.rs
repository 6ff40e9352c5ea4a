use clap::Parser;
use clap::Subcommand;
use cmd::command::run;
use cmd::command::run::Run;
use cmd::command::schema;
use cmd::command::schema::Schema;
use cmd::config::LogLevel;
use cmd::error::Error;
use cmd::error::Result;
use cmd::init_shutdown_signal;
use common::config::Config;
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[derive(Subcommand, Clone)]
enum Commands {
    /// Provision the keyspace, load the catalog and generate orders
    Run(Run),
    /// Print the schema statements
    Schema(Schema),
}

#[derive(Parser)]
#[command(propagate_version = true)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Overrides `log.level` from the config
    #[arg(long, value_enum, global = true)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let command = match args.command {
        None => return Err(Error::BadRequest("no command specified".to_string())),
        Some(cmd) => cmd,
    };

    let mut raw = match &command {
        Commands::Run(run) => run.load_config()?,
        Commands::Schema(schema) => schema.load_config()?,
    };
    if let Some(level) = args.log_level {
        raw.log.level = level;
    }
    let cfg: Config = raw.try_into()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cfg.log.level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match &command {
        Commands::Run(run) => {
            let version = env!("CARGO_PKG_VERSION");
            info!("retail order generator v{version}");
            let shutdown = init_shutdown_signal()?;
            let report = run::start(run, &cfg, shutdown).await?;
            if !report.is_success() {
                return Err(Error::OrdersFailed(report.failed()));
            }
        }
        Commands::Schema(_) => schema::start(&cfg)?,
    }

    Ok(())
}
