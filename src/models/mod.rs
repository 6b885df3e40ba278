pub mod address;
pub mod coordinate;
pub mod fix;
pub mod order;
pub mod route;
