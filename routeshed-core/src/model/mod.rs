mod area_unit;
mod assignment;
mod error;
mod route;
mod stop;
mod zone;

pub use area_unit::{AreaUnit, Geoid};
pub use assignment::UnitAssignment;
pub use error::PartitionError;
pub use route::{RouteId, RouteLabel};
pub use stop::{parse_activity, ResolvedStop, RouteActivity, Stop, StopId};
pub use zone::Zone;
