// Chrome War console host: configuration, collaborators, draft desk and the
// clock ticker.

pub mod config;
pub mod draft;
pub mod providers;
pub mod ticker;
