pub mod gallery_worker;
pub mod surface_loader;
