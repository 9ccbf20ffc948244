/// Contains constant values which are used as arguments to functions and in log messages.
pub mod constants;

/// Contains the error handling tooling.
pub mod error;

/// Contains tools to work with Kubernetes APIs.
pub mod kube_client;

/// Contains macros.
pub(crate) mod macros;

/// Contains tools for working with files.
pub mod file;
