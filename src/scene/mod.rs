pub mod composer;
pub mod window;
