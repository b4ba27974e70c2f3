pub mod container;

pub use container::{Container, ContainerConfig, ServiceSettings};
