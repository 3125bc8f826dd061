pub mod pixmap;
pub mod rasterizer;
pub mod sink;
