//! Form-error tracking and the empathic help gate

pub mod tracker;

pub use tracker::{FormErrorTracker, HelpContext};
