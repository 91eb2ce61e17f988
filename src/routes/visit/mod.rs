mod handler;
mod model;

pub use handler::{create_visit, delete_visit, list_visits, public_visits};
