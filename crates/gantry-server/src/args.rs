use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    #[arg(long, env = "GANTRY_ADDR", default_value = "0.0.0.0:18080")]
    pub listen_addr: String,

    /// Base URL of the status-aggregation service supplying the per-node
    /// GPU and deployed-model state.
    #[arg(long, env = "GANTRY_AGGREGATOR_URL", default_value = "http://127.0.0.1:18070")]
    pub aggregator_url: String,

    /// Base URL of the node/model/environment registry service.
    #[arg(long, env = "GANTRY_REGISTRY_URL", default_value = "http://127.0.0.1:18060")]
    pub registry_url: String,

    /// Base URL of the queue-metrics service.
    #[arg(long, env = "GANTRY_QUEUE_URL", default_value = "http://127.0.0.1:18050")]
    pub queue_url: String,

    #[arg(long, env = "GANTRY_POLL_INTERVAL_SECS", default_value_t = 10)]
    pub poll_interval_secs: u64,

    /// Delay before the expedited post-switch refresh.
    #[arg(long, env = "GANTRY_SETTLE_DELAY_MS", default_value_t = 1000)]
    pub settle_delay_ms: u64,

    /// How long one consumer read keeps background polling alive.
    #[arg(long, env = "GANTRY_OBSERVATION_TTL_SECS", default_value_t = 30)]
    pub observation_ttl_secs: u64,

    /// Timeout for node status/catalog reads.
    #[arg(long, env = "GANTRY_READ_TIMEOUT_SECS", default_value_t = 30)]
    pub read_timeout_secs: u64,

    /// Timeout for start/stop commands; model loads can take minutes.
    #[arg(long, env = "GANTRY_COMMAND_TIMEOUT_SECS", default_value_t = 180)]
    pub command_timeout_secs: u64,

    #[arg(long, env = "GANTRY_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    #[arg(long, env = "GANTRY_OTLP_TOKEN")]
    pub otlp_token: Option<String>,
}
