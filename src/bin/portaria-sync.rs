//! Terminal-side tool for the offline sale queue.

use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use portaria::models::PaymentMethod;
use portaria::offline::{CartItem, OfflineStore, Reconciler, RpcSubmitter};

#[derive(Parser)]
#[command(name = "portaria-sync")]
#[command(about = "Queue sales while offline and replay them against a Portaria server")]
struct Cli {
    /// Local queue database.
    #[arg(long, env = "PORTARIA_OFFLINE_DB", default_value = "sqlite://portaria-offline.db")]
    db: String,
    #[arg(long, env = "PORTARIA_LOG_LEVEL", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print how many sales are waiting to be synced.
    Pending,
    /// Queue a sale of `quantity` tickets of one type.
    Enqueue {
        #[arg(value_parser = clap::value_parser!(i32).range(1..))]
        ticket_type_id: i32,
        #[arg(value_parser = clap::value_parser!(u32).range(1..))]
        quantity: u32,
        #[arg(value_parser = parse_payment_method)]
        payment_method: PaymentMethod,
    },
    /// Replay every pending sale once.
    Sync(ServerArgs),
    /// Probe the server and replay pending sales whenever it comes back.
    Watch {
        #[command(flatten)]
        server: ServerArgs,
        /// Seconds between connectivity probes.
        #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..=3600))]
        interval: u64,
    },
}

#[derive(clap::Args)]
struct ServerArgs {
    #[arg(long, env = "PORTARIA_SERVER_URL")]
    server_url: String,
    /// PIN used to open sessions on the server.
    #[arg(long, env = "PORTARIA_ADMIN_PIN", hide_env_values = true)]
    pin: String,
    /// Synced sales older than this are purged from the queue.
    #[arg(long, env = "PORTARIA_OFFLINE_RETENTION_DAYS", default_value_t = 7)]
    retention_days: i64,
}

fn parse_payment_method(value: &str) -> Result<PaymentMethod, String> {
    PaymentMethod::parse(value)
        .ok_or_else(|| format!("unknown payment method '{value}' (dinheiro, pix or cartao)"))
}

impl ServerArgs {
    fn reconciler(
        &self,
        store: OfflineStore,
    ) -> Result<Reconciler<RpcSubmitter>, Box<dyn std::error::Error>> {
        let submitter = RpcSubmitter::new(&self.server_url, &self.pin)?;
        Ok(Reconciler::new(store, submitter)
            .with_retention(chrono::Duration::days(self.retention_days)))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    let store = OfflineStore::open(&cli.db).await?;

    match cli.command {
        Command::Pending => {
            println!("{}", store.pending_count().await?);
        }
        Command::Enqueue {
            ticket_type_id,
            quantity,
            payment_method,
        } => {
            let id = store
                .save_sale(&[CartItem { ticket_type_id, quantity }], payment_method)
                .await?;
            println!("queued sale {id}");
        }
        Command::Sync(server) => {
            let reconciler = server.reconciler(store)?;
            let report = reconciler.sync_pending().await?;
            println!(
                "synced {} sale(s), {} ticket(s); {} failed; {} cleaned",
                report.synced, report.tickets_created, report.failed, report.cleaned
            );
        }
        Command::Watch { server, interval } => {
            let reconciler = server.reconciler(store)?;
            let (tx, rx) = watch::channel(false);
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                let _ = tx.send(true);
            });
            tracing::info!("Watching connectivity every {interval}s");
            reconciler
                .watch_connectivity(Duration::from_secs(interval), rx)
                .await;
        }
    }

    Ok(())
}
