//! Configuration structures shared by the decode engines.
//!
//! Contains the alignment and repeat descriptions both engines are built
//! from, and the keyed parameter dictionaries that validate into engine
//! configurations.

pub mod alignment;
pub mod params;
pub mod repeat;
