use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;

use crate::client::NodeClient;

/// Hands out one [`NodeClient`] per node address, created on first use.
///
/// All clients share one `reqwest::Client` so the connection pool is
/// fleet-wide; the per-node wrapper only fixes the base URL and timeouts.
pub struct NodeManager {
    http: reqwest::Client,
    command_timeout: Duration,
    clients: DashMap<String, Arc<NodeClient>>,
}

impl NodeManager {
    pub fn new(read_timeout: Duration, command_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .timeout(read_timeout)
            .build()
            .unwrap_or_default();
        Self {
            http,
            command_timeout,
            clients: DashMap::new(),
        }
    }

    pub fn client(&self, node_ip: &str, node_port: u16) -> Arc<NodeClient> {
        let key = format!("{node_ip}:{node_port}");
        self.clients
            .entry(key)
            .or_insert_with(|| {
                Arc::new(NodeClient::new(
                    node_ip,
                    node_port,
                    self.http.clone(),
                    self.command_timeout,
                ))
            })
            .clone()
    }
}
