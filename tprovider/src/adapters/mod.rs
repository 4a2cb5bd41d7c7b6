//! Concrete completion gateway adapters.

#[cfg(feature = "gateway-gigachat")]
pub mod gigachat;
