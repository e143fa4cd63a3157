pub mod gallery_client;
pub mod person;
