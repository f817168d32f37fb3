//! Neural network layers.
//!
//! Every layer owns its parameters, never mutates them after construction and
//! takes `&self` in `forward`, so a built layer can be shared across threads.

pub mod activation;
pub mod init;
pub mod linear;
pub mod module;
pub mod norm;
pub mod transformer;

pub use activation::Activation;
pub use init::UniformInit;
pub use linear::Linear;
pub use module::Module;
pub use norm::LayerNorm;
