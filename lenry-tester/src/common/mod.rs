pub mod scenario;
pub mod util;

pub use util::{parse_player_counts, split_csv};
