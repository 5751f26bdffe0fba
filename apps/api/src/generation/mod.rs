// Resume generation: theme styles, document assembly, the cached
// compile pipeline and its HTTP handlers.

pub mod generator;
pub mod handlers;
pub mod service;
pub mod styles;
