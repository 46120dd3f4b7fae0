//! Node graph integration tests
//!
//! Tests are organized by node kind and concern: object node mutations,
//! member node replacement, reference classification, node identity and
//! lifetime, and change notifications.

mod object_node;
