//! Request, response and funnel model consumed by the extrapolation engine.
//!
//! # Module structure
//!
//! - [`funnel`]: the sampling configuration a response was computed under
//! - [`filter`]: predicates carried by requests and synthesized for base queries
//! - [`request`]: the tagged union of analytics request kinds
//! - [`response`]: the matching tagged union of materialized results

pub mod filter;
pub mod funnel;
pub mod request;
pub mod response;

pub use filter::{Filter, FilterOp, FilterValue};
pub use funnel::Funnel;
pub use request::{
    ActionKind, ActionRequest, CountRequest, DistinctRequest, GroupRequest, HistogramRequest,
    MultiQueryRequest, MultiTimeQueryRequest, Period, QueryRequest, StatsRequest,
    StatsTrendRequest, TrendRequest,
};
pub use response::{
    ActionResponse, BucketCount, BucketResponse, CountResponse, DistinctResponse, GroupResponse,
    GroupTree, GroupValue, HistogramResponse, MultiQueryResponse, MultiTimeQueryResponse, Number,
    QueryResponse, StatsResponse, StatsTrendResponse, StatsTrendValue, StatsValue, TrendResponse,
};
