//! HTTP handlers for the Spinbook API.

/// Element CRUD and filtered listing.
pub mod element;
/// Profile and folder endpoints.
pub mod folder;
/// Media upload endpoint.
pub mod media;
