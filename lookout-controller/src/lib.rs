#![doc = include_str!("../../README.md")]

pub mod capabilities;
pub mod detection;
pub mod simulator;
pub mod skill;
pub mod skill_config;
