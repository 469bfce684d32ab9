//! Core types and algorithms for the Souche genealogy engine.
//!
//! Turns flat person records into a navigable family forest: tree
//! construction, couple inference, layout, gesture classification, and
//! position persistence through the [`store::RelationshipStore`] trait.
//!
//! This crate is deliberately free of HTTP and database dependencies.

pub mod couples;
pub mod forest;
pub mod gesture;
pub mod layout;
pub mod person;
pub mod position;
pub mod recorder;
pub mod store;
pub mod validate;

pub use couples::{Couple, CoupleIndex, ParentRef, resolve};
pub use forest::{TreeNode, build};
pub use person::{Genre, Person, PersonId};
