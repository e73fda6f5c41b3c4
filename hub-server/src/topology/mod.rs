//! Hub topology and route planning

mod error;
mod graph;
mod route;
pub mod seed;
mod service;

pub use error::{TopologyDefect, TopologyError, TopologyResult};
pub use graph::HubGraph;
pub use route::RouteGenerator;
pub use seed::{TopologyDocument, kerala_network};
pub use service::TopologyService;
