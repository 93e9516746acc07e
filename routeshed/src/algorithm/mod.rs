pub mod assign;
pub mod dissolve;
pub mod resolve;
pub mod stop_index;
pub mod study_area;

pub use assign::UnitToZoneAssigner;
pub use dissolve::ZoneDissolver;
pub use resolve::StopRouteResolver;
pub use stop_index::{NearestStop, StopIndex};
pub use study_area::{CoverageSummary, StudyArea, StudyAreaFilter};

#[cfg(test)]
pub(crate) mod test_fixtures;
