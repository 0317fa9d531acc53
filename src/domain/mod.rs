// Domain layer - Readings, day-scoped series and freshness rules
pub mod freshness;
pub mod reading;
pub mod series;
pub mod snapshot;
