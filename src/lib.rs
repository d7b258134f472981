pub mod benchmark;
pub mod bots;
pub mod circuit;
pub mod clock;
pub mod config;
pub mod fingerprint;
pub mod kinematics;
pub mod library;
pub mod protocol;
pub mod rng;
pub mod runner;
pub mod session;
pub mod sim;
pub mod steering;
pub mod util;
pub mod vector;
