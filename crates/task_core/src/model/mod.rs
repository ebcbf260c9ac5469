mod depends;
mod task;
mod validate;

pub use depends::Dependency;
pub use task::{ANNOTATION_PREFIX, RESERVED_FIELDS, Status, Task};

pub(crate) use task::DATE_FIELDS;
