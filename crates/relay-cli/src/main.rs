use std::collections::BTreeMap;
use std::time::Duration;

use clap::Parser;
use relay_core::app::config::{
    DEFAULT_API_KEY, DEFAULT_BIND_ADDR, DEFAULT_FORWARD_CONCURRENCY, DEFAULT_FORWARD_TIMEOUT_SECS,
};
use relay_core::app::{ApiKey, GatewayConfig};
use relay_core::domain::AgentId;
use relay_core::http;
use relay_core::observability;

/// Task-dispatch gateway for the agent services.
///
/// Every flag can also be set through the environment variable shown in `--help`.
#[derive(Parser)]
#[command(name = "relay")]
#[command(version)]
#[command(about = "Accepts tasks, forwards them to agent services, stores their results")]
struct Cli {
    #[arg(long, env = "RELAY_BIND_ADDR", default_value = DEFAULT_BIND_ADDR)]
    bind_addr: String,

    /// `X-API-Key` で要求し、配送時にも送る共有シークレット
    #[arg(long, env = "AGENTS_API_KEY", default_value = DEFAULT_API_KEY, hide_env_values = true)]
    api_key: String,

    /// 1 件の配送を打ち切るまでの秒数
    #[arg(long, env = "RELAY_FORWARD_TIMEOUT_SECS", default_value_t = DEFAULT_FORWARD_TIMEOUT_SECS)]
    forward_timeout_secs: u64,

    /// agent ごとの同時配送数の上限
    #[arg(long, env = "RELAY_FORWARD_CONCURRENCY", default_value_t = DEFAULT_FORWARD_CONCURRENCY)]
    forward_concurrency: usize,

    #[arg(long, env = "N8N_COORD_URL", default_value = "https://REPLACE-ME/coordinateur")]
    coordinateur_url: String,

    #[arg(long, env = "N8N_CHERCH_URL", default_value = "https://REPLACE-ME/chercheur")]
    chercheur_url: String,

    #[arg(long, env = "N8N_EXPE_URL", default_value = "https://REPLACE-ME/experimentateur")]
    experimentateur_url: String,

    #[arg(long, env = "N8N_ANALY_URL", default_value = "https://REPLACE-ME/analyste")]
    analyste_url: String,

    #[arg(long, env = "N8N_ARCHI_URL", default_value = "https://REPLACE-ME/architecte")]
    architecte_url: String,

    #[arg(long, env = "N8N_SECU_URL", default_value = "https://REPLACE-ME/securite")]
    securite_url: String,

    #[arg(long, env = "N8N_DOCU_URL", default_value = "https://REPLACE-ME/documentariste")]
    documentariste_url: String,
}

impl Cli {
    fn into_config(self) -> GatewayConfig {
        let routes = BTreeMap::from([
            (AgentId::Coordinateur, self.coordinateur_url),
            (AgentId::Chercheur, self.chercheur_url),
            (AgentId::Experimentateur, self.experimentateur_url),
            (AgentId::Analyste, self.analyste_url),
            (AgentId::Architecte, self.architecte_url),
            (AgentId::Securite, self.securite_url),
            (AgentId::Documentariste, self.documentariste_url),
        ]);

        GatewayConfig {
            bind_addr: self.bind_addr,
            api_key: ApiKey::new(self.api_key),
            routes,
            forward_timeout: Duration::from_secs(self.forward_timeout_secs),
            forward_concurrency: self.forward_concurrency,
        }
    }
}

#[tokio::main]
async fn main() {
    observability::init_tracing();
    let config = Cli::parse().into_config();

    if let Err(e) = http::run(config, http::shutdown_signal()).await {
        tracing::error!(error = %e, "gateway failed");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
