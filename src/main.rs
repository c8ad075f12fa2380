use std::collections::HashMap;

use bolt_driver::bolt::message::{Auth, BeginExtra};
use bolt_driver::bolt::TlsConfig;
use bolt_driver::{BoltConfig, Session, SessionConfig, Value};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "bolt-shell")]
#[command(about = "Run a single query against a Bolt server and print the rows as JSON", long_about = None)]
struct Args {
    /// Query to run
    query: String,

    /// Server host
    #[arg(long, env = "BOLT_HOST", default_value = "localhost")]
    host: String,

    /// Server port
    #[arg(short, long, env = "BOLT_PORT", default_value_t = 7687)]
    port: u16,

    /// Basic auth user
    #[arg(short, long, env = "BOLT_USER")]
    user: Option<String>,

    /// Basic auth password (no auth when omitted)
    #[arg(long, env = "BOLT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Connect over TLS
    #[arg(long, env = "BOLT_TLS")]
    tls: bool,

    /// Target database
    #[arg(short, long)]
    database: Option<String>,

    /// Query parameters as a JSON object
    #[arg(long)]
    params: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bolt_driver=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut bolt = BoltConfig::new(args.host).port(args.port);
    if args.tls {
        bolt = bolt.tls(TlsConfig::default());
    }
    let auth = match args.password {
        Some(password) => Auth::basic(args.user.as_deref(), password),
        None => Auth::none(),
    };

    let parameters: HashMap<String, Value> = match args.params {
        Some(json) => {
            let json: serde_json::Value = serde_json::from_str(&json)?;
            Value::from(json).into_map()?
        }
        None => HashMap::new(),
    };
    let mut extra = BeginExtra::default();
    if let Some(db) = args.database {
        extra = extra.db(db);
    }

    let session = Session::new(SessionConfig::new(bolt).auth(auth));
    let result = session.fetch_all(&args.query, parameters, extra).await;

    match result {
        Ok(result) => {
            for record in result.records {
                let row: serde_json::Map<String, serde_json::Value> = result
                    .fields
                    .iter()
                    .cloned()
                    .zip(record.into_iter().map(serde_json::Value::from))
                    .collect();
                println!("{}", serde_json::Value::Object(row));
            }
            tracing::info!("{}", result.summary);
        }
        Err(e) => {
            let _ = session.connection().goodbye().await;
            return Err(e.into());
        }
    }

    session.connection().goodbye().await?;
    Ok(())
}
