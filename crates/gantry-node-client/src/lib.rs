mod client;
mod manager;

pub use client::NodeClient;
pub use manager::NodeManager;
