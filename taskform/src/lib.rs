pub mod editors;
pub mod error;
pub mod notification;
pub mod process;
pub mod reference;
pub mod services;
pub mod session;
pub mod task;
pub mod upload;
pub mod wps;
#[cfg(test)]
mod testutil;

pub use error::{SaveBlocked, TaskFormError};
pub use process::ProcessId;
pub use session::TaskEditor;
pub use task::Task;
