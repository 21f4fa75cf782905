pub mod types;
pub mod group_key;
pub mod selector;

pub use types::{HistoryEntry, DecisionRecord};
pub use group_key::normalize;
pub use selector::select;
