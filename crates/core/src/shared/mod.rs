pub mod api_client;
pub mod api_error;
pub mod asset_resolver;
pub mod bounding_box;
pub mod config;
pub mod constants;
pub mod frame;
pub mod sync;
