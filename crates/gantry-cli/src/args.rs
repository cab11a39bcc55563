use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "gantry")]
#[command(about = "Gantry CLI for GPU deployment management", long_about = None)]
pub struct Args {
    /// Gantry server URL
    #[arg(
        long,
        env = "GANTRY_SERVER_URL",
        default_value = "http://127.0.0.1:18080"
    )]
    pub server_url: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the current fleet deployment snapshot
    Status {
        /// Restrict to one environment
        #[arg(long)]
        environment: Option<i64>,
    },
    /// Force an immediate reconciliation cycle
    Refresh,
    /// Switch the model deployed on a GPU slot
    Switch {
        /// Node id
        #[arg(long)]
        node: i64,
        /// GPU id on the node
        #[arg(long)]
        gpu: u32,
        /// Model to start; omit for a stop-only switch
        #[arg(long)]
        model: Option<String>,
        /// Model to stop first, if one is running
        #[arg(long)]
        stop: Option<String>,
        /// Extra start configuration as inline JSON
        #[arg(long)]
        config: Option<String>,
    },
    /// List registered worker nodes
    Nodes,
    /// List registered model specs
    Models {
        /// Restrict to one environment
        #[arg(long)]
        environment: Option<i64>,
    },
    /// List environments
    Environments,
    /// Show queue depth for a model
    Queue {
        /// Model name
        model: String,
        /// Show historical samples instead of the current depth
        #[arg(long)]
        history: bool,
        /// Hours of history to fetch
        #[arg(long)]
        hours: Option<u32>,
    },
}
