pub mod endpoints;
pub mod feed;
