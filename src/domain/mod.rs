// Domain layer: core models, static tables and ports (interfaces).

pub mod catalog;
pub mod model;
pub mod ports;
