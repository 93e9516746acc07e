pub mod boundaries;
pub mod fs;
pub mod population;
pub mod stops;

mod checkpoint;

pub use checkpoint::ZoneCheckpoint;
