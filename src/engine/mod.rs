pub mod classifier;
pub mod reducer;
pub mod rates;
pub mod splits;
pub mod zone;

pub use classifier::{classify_outcome, classify_pitch};
pub use reducer::reduce_to_plate_appearances;
pub use rates::aggregate_rates;
pub use splits::aggregate_by;
pub use zone::bin_zone_grid;
