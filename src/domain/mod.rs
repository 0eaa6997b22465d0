// Domain layer: core models and ports (interfaces). No I/O beyond the port traits.

pub mod model;
pub mod ports;
