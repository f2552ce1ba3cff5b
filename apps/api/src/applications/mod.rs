// Application Lifecycle Tracker: user-facing status machine and its HTTP surface.

pub mod handlers;
pub mod lifecycle;
pub mod service;
