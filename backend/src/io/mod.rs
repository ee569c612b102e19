//! # IO Module
//!
//! Interface layer that exposes the domain over HTTP. Handlers translate
//! requests into domain commands and domain results or errors into JSON.

pub mod rest;
