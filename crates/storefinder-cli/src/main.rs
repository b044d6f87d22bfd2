mod lookup;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "storefinder")]
#[command(about = "Store directory lookup from the command line")]
struct Cli {
    /// Print results as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search a brand's stores by city, state, or postal code
    Search {
        /// Brand ID as configured in brands.yaml
        #[arg(long)]
        brand: String,
        /// Free-text query (e.g. "salt lake city, ut" or "98101")
        #[arg(long)]
        query: String,
        /// Configured marketplace ID (defaults to `STOREFINDER_DEFAULT_MARKETPLACE_ID`)
        #[arg(long)]
        marketplace: Option<String>,
    },
    /// Geolocate stores near a customer
    Nearby {
        /// Brand ID as configured in brands.yaml
        #[arg(long)]
        brand: String,
        /// Client IP address used for geolocation
        #[arg(long)]
        ip: Option<String>,
        #[arg(long)]
        customer_id: Option<String>,
        #[arg(long)]
        session_id: Option<String>,
        /// Configured marketplace ID (defaults to `STOREFINDER_DEFAULT_MARKETPLACE_ID`)
        #[arg(long)]
        marketplace: Option<String>,
    },
    /// List configured brands
    Brands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("no command given; run `storefinder --help`");
        return Ok(());
    };

    let config = storefinder_core::load_app_config()?;
    match command {
        Commands::Search {
            brand,
            query,
            marketplace,
        } => {
            let marketplace = marketplace.unwrap_or_else(|| config.default_marketplace_id.clone());
            lookup::run_search(&config, &brand, &marketplace, &query, cli.json).await?;
        }
        Commands::Nearby {
            brand,
            ip,
            customer_id,
            session_id,
            marketplace,
        } => {
            let marketplace = marketplace.unwrap_or_else(|| config.default_marketplace_id.clone());
            let geo = storefinder_directory::GeoContext {
                customer_id,
                session_id,
                ip_address: ip,
            };
            lookup::run_nearby(&config, &brand, &marketplace, geo, cli.json).await?;
        }
        Commands::Brands => lookup::run_brands(&config, cli.json)?,
    }

    Ok(())
}
