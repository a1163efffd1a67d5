pub mod coercion;
pub mod rows;
