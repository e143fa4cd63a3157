pub mod camera;
pub mod video_sink;
