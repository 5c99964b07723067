mod task;
pub use task::TaskKind;

mod spec;
pub use spec::TaskSpec;
