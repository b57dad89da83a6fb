//! Domain entities for the RFID relay hub.
//!
//! This module contains pure business types with no infrastructure
//! dependencies: no sockets, no tasks, no HTTP.
//!
//! # What is "domain" in Clean Architecture? (for beginners)
//!
//! The innermost layer of a clean architecture holds the data types and rules
//! that make the system what it is.  Here that is small: a scan event, the
//! clock that timestamps it, and the identifier handed to each connection.
//! Outer layers (the server's registry, dispatcher and socket handling)
//! depend on these types, never the other way round.

/// Connection identifiers and their allocator.
pub mod connection_id;

/// The scan event value and the broker clock.
pub mod scan;
