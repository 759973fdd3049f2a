//! Route handlers (C10): the file-service state machine and the key
//! registry, one module per spec.md §4.4 route group.

pub mod fs;
pub mod keyhandler;
