pub mod ai;
pub mod geometry;
pub mod pathfinding;
pub mod snake;
pub mod strategy;
