pub mod algorithms;
pub mod command;
pub mod config;
pub mod error;
pub mod forwarding;
pub mod network;
pub mod protocol;
pub mod router;
pub mod routing_table;
pub mod service;
pub mod types;

pub use command::{Command, Output};
pub use config::RouterConfig;
pub use error::RouterError;
pub use forwarding::{ForwardingDecision, ForwardingEntry};
pub use network::InterfaceId;
pub use protocol::{Advertisement, RoutingUpdate};
pub use router::{Router, RouterStats};
pub use routing_table::RouteRecord;
pub use service::{RouterHandle, RouterService};
pub use types::{Metric, Prefix};
