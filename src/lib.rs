//! Platform registry and tool/wand event routing for a world-editing
//! toolkit hosted by one or more server platforms.

pub mod actor;
pub mod event;
pub mod platform;
pub mod replay;
pub mod route;
pub mod session;
pub mod sim;
pub mod tool;
pub mod world;
