pub mod refresh;
pub mod route;
pub mod viewport;
