// Chat domain: prompt classification, upstream orchestration, fallback
// synthesis, and the active-request registry.

pub mod classify;
pub mod fallback;
pub mod registry;
pub mod upstream;
