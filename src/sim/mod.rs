pub mod event;
pub mod runner;
pub mod spawn;
pub mod step;
pub mod world;
