mod handler;
mod model;

pub use handler::{country_ranking, user_ranking};
