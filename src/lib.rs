pub mod configuration;
pub mod dal;
pub mod domain;
pub mod providers;
pub mod routes;
pub mod services;
pub mod startup;
