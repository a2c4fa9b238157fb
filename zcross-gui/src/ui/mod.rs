//! # UI Module
//!
//! This module contains the UI components for the pitch follower.

pub mod main_display;
