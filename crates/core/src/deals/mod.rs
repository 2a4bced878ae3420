//! Deals: model, stage enumeration and pipeline read models.

mod deals_model;
mod pipeline;

pub use deals_model::*;
pub use pipeline::*;
