pub mod dashboard_handlers;
pub mod job_handlers;
pub mod search_handlers;
pub mod system_handlers;

pub use dashboard_handlers::*;
pub use job_handlers::*;
pub use search_handlers::*;
pub use system_handlers::*;
