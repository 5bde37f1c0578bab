//! Declarative and wire models for every managed resource kind.
//!
//! Each kind has two mirror shapes: a `*State` struct (the declarative model
//! the orchestrator hands us, built from [`Field`](crate::types::Field)
//! containers so unset and null stay distinct) and a wire struct matching the
//! Port API's JSON documents. The translation layer converts between them.

pub mod action;
pub mod aggregation;
pub mod blueprint;
pub mod calculation;
pub mod entity;
pub mod folder;
pub mod integration;
pub mod page;
pub mod permissions;
pub mod scorecard;
pub mod secret;
pub mod team;
pub mod webhook;
