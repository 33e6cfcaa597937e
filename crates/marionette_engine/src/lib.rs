pub mod actions;
pub mod directory;
pub mod fallback;
pub mod host;
pub mod jobs;
pub mod scheduler;
pub mod status;

pub use actions::{ActionEngine, Collaborators};
pub use directory::PersonaDirectory;
pub use host::InMemoryHost;
pub use jobs::{boot, engine_jobs};
pub use scheduler::{JobSpec, JobStatus, Scheduler};
pub use status::{EngineStatus, StatusReporter};
