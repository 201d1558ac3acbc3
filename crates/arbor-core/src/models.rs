//! Domain models for the resource tree.

pub mod resource;
