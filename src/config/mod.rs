pub mod schema;

pub use schema::{
    ChannelConfig, Config, ObservabilityConfig, ReliabilityConfig, RewriteConfig, ServiceConfig,
};
