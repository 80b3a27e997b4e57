pub mod default_route;
pub mod lead_route;
