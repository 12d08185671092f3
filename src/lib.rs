// src/lib.rs

pub mod classify;
pub mod config;
pub mod error;
pub mod field;
pub mod hysteresis;
pub mod lattice;
pub mod llg;
pub mod macrospin;
pub mod neighbours;
pub mod params;
pub mod reduce;
pub mod state;
pub mod system;
pub mod table;
pub mod vec3;
