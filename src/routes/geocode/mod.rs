mod handler;

pub use handler::reverse_geocode;
