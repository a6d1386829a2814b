// src/scoring/mod.rs
//
// The scoring and performance-aggregation engine. The math lives in pure
// functions (score, aggregate, recommend); `pipeline` wires them to the
// database and owns the transactional and locking discipline.

pub mod aggregate;
pub mod locks;
pub mod pipeline;
pub mod recommend;
pub mod score;
