pub mod archiver;
pub mod collector;
pub mod controller;
pub mod organizer;
pub mod recorder;
pub mod types;
