// Scoring core: weight profiles, tier classification, the skill-overlap gate
// and the weighted aggregator. WeightStore and the handlers are the only I/O.

pub mod aggregator;
pub mod handlers;
pub mod overlap;
pub mod profile;
pub mod weight_store;
pub mod weights;
