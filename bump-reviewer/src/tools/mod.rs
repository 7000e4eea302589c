//! Thin clients over the external toolchain.
//!
//! One struct per binary, one method per operation the pipeline actually
//! uses. Clients are generic over [`crate::exec::CommandRunner`] so the whole
//! toolchain can be faked in tests.

pub mod dyff;
pub mod gh;
pub mod git;
pub mod helm;

pub use dyff::DyffCli;
pub use gh::GhCli;
pub use git::GitCli;
pub use helm::HelmCli;
