pub mod handlers;
pub mod middleware;
pub mod pipeline;
pub mod routes;
pub mod train_locations;

pub use routes::create_router;
