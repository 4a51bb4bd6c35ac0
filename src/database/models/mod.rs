pub mod project;
pub mod task;
pub mod user;

pub use project::{Project, ProjectChanges, ProjectRef};
pub use task::{NewTask, ScopedTask, Task, TaskPatch, TaskPriority, TaskStats, TaskStatus, TaskView};
pub use user::{User, UserChanges, UserSummary};
