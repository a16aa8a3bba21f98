//! API Routes
//!
//! Route handlers organized by functionality.

pub mod health;
pub mod info;
pub mod streaming;
pub mod unary;
