pub mod acquisition;
pub mod diff_engine;
pub mod pixel;
pub mod pixel_buffer;
pub mod poll_policy;
pub mod smart_pixel;
pub mod utils;
