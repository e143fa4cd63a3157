pub mod capture_controller;
pub mod display;
pub mod frame_pipeline;
pub mod person_gallery;
pub mod pipeline_logger;
