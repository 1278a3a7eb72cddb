//! Unit tests for annotation format implementations.
//!
//! These tests verify decoding of real-world documents and that a list
//! survives a save/load cycle through each format.
