pub mod analytics;
pub mod db;
pub mod goals;
pub mod models;
pub mod muscle_map;
pub mod service;
