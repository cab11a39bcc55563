mod args;
mod output;

use anyhow::{bail, Result};
use clap::Parser;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use gantry_common::{
    DeploymentSummary, Environment, ModelSpec, NodeRecord, QueueDepth, QueueDepthSample,
    SwitchOutcome,
};

use crate::args::{Args, Command};
use crate::output::{
    print_deployment_summary, print_environments, print_models, print_nodes, print_queue_depth,
    print_queue_history, print_switch_outcome,
};

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

fn api_url(server_url: &str, path: &str) -> String {
    format!("{}/api/v1{}", server_url.trim_end_matches('/'), path)
}

async fn read_data<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
    if !resp.status().is_success() {
        bail!("server returned {}: {}", resp.status(), resp.text().await?);
    }
    let envelope: Envelope<T> = resp.json().await?;
    Ok(envelope.data)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let client = Client::new();

    match args.command {
        Command::Status { environment } => {
            let url = api_url(&args.server_url, "/deployments/status");
            let mut req = client.get(&url);
            if let Some(env) = environment {
                req = req.query(&[("environment_id", env)]);
            }
            let summary: DeploymentSummary = read_data(req.send().await?).await?;
            print_deployment_summary(&summary);
        }
        Command::Refresh => {
            let url = api_url(&args.server_url, "/deployments/refresh");
            let result: serde_json::Value = read_data(client.post(&url).send().await?).await?;
            println!(
                "refresh: {}",
                result["refresh"].as_str().unwrap_or("unknown")
            );
        }
        Command::Switch {
            node,
            gpu,
            model,
            stop,
            config,
        } => {
            let url = api_url(&args.server_url, &format!("/nodes/{node}/gpus/{gpu}/switch"));
            let mut body = serde_json::json!({});
            if let Some(model) = &model {
                body["new_model"] = serde_json::json!(model);
            }
            if let Some(stop) = &stop {
                body["old_model"] = serde_json::json!(stop);
            }
            if let Some(config) = &config {
                body["config"] = serde_json::from_str(config)?;
            }
            let resp = client.post(&url).json(&body).send().await?;
            let outcome: SwitchOutcome = read_data(resp).await?;
            print_switch_outcome(&outcome);
        }
        Command::Nodes => {
            let url = api_url(&args.server_url, "/nodes");
            let nodes: Vec<NodeRecord> = read_data(client.get(&url).send().await?).await?;
            print_nodes(&nodes);
        }
        Command::Models { environment } => {
            let url = api_url(&args.server_url, "/models");
            let mut req = client.get(&url);
            if let Some(env) = environment {
                req = req.query(&[("environment_id", env)]);
            }
            let models: Vec<ModelSpec> = read_data(req.send().await?).await?;
            print_models(&models);
        }
        Command::Environments => {
            let url = api_url(&args.server_url, "/environments");
            let environments: Vec<Environment> =
                read_data(client.get(&url).send().await?).await?;
            print_environments(&environments);
        }
        Command::Queue {
            model,
            history,
            hours,
        } => {
            if history {
                let url = api_url(&args.server_url, &format!("/queues/{model}/history"));
                let mut req = client.get(&url);
                if let Some(hours) = hours {
                    req = req.query(&[("hours", hours)]);
                }
                let samples: Vec<QueueDepthSample> = read_data(req.send().await?).await?;
                print_queue_history(&model, &samples);
            } else {
                let url = api_url(&args.server_url, &format!("/queues/{model}"));
                let depth: QueueDepth = read_data(client.get(&url).send().await?).await?;
                print_queue_depth(&depth);
            }
        }
    }

    Ok(())
}
