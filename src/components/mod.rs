pub mod force_graph;
pub mod fund_flow;
