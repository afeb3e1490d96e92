// Domain layer: campaign records, sheet layout, session flow and ports.

pub mod layout;
pub mod model;
pub mod ports;
pub mod session;
