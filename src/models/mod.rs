mod project;
mod project_member;
mod service_order;
mod user;

pub use project::*;
pub use project_member::*;
pub use service_order::*;
pub use user::*;
