// Ecommerce Search Infrastructure - Elasticsearch Adapter
// Implements: SearchBackend over the Elasticsearch REST API

mod client;
mod error;
mod propagation;
mod settings;

pub use client::ElasticsearchClient;
pub use error::{classify_response, ConnectError};
pub use settings::{parse_hosts, AuthMode, ElasticsearchSettings};
