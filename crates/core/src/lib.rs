pub mod capture;
pub mod detection;
pub mod gallery;
pub mod overlay;
pub mod pipeline;
pub mod shared;
