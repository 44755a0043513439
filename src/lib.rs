pub mod component;
pub mod contract;
pub mod dijkstra;
pub mod error;
pub mod geo_primitives;
pub mod graph;
pub mod network;
pub mod rsp;
pub mod sortable;
pub mod tables;
