//! Diversity-aware retrieval over the vector index

pub mod mmr;
mod retriever;

pub use retriever::{RetrievalOptions, Retriever};
