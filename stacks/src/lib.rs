pub mod bucket;
pub mod buildspec;
pub mod environment;
pub mod iam;
pub mod naming;
pub mod pipeline;
pub mod secret;
pub mod stack;
pub mod storage;
pub mod template;

pub use environment::{BuildEnvironment, DeployEnvironment};
pub use naming::Naming;
pub use pipeline::{PipelineProps, PipelineStack};
pub use stack::Stack;
pub use storage::StorageStack;
pub use template::{CfnResource, Template};
