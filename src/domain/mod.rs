// Domain layer: pharmacy records, query documents and the storage port.

pub mod model;
pub mod ports;
pub mod query;
