// Domain layer: lead models, the business calendar, settings and ports.

pub mod calendar;
pub mod model;
pub mod ports;
pub mod settings;
