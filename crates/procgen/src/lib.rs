//! Procedural generation for the backdrop: the streak starfield.

pub mod starfield;

pub use starfield::*;
