//! Environment variable access behind a trait, so configuration loaders can
//! be exercised without mutating the process environment.
//!
//! ```
//! use qap_std::env::{ReadEnv, SystemEnv};
//!
//! fn listen_port<E: ReadEnv>(env: &E) -> u16 {
//!     env.parse_or("QAP_GATEWAY_PORT", 8080)
//! }
//!
//! let _port = listen_port(&SystemEnv);
//! ```

#[cfg(any(test, feature = "test-support"))]
mod in_memory;
mod read_env;
mod system;

#[cfg(any(test, feature = "test-support"))]
pub use in_memory::InMemoryEnv;
pub use read_env::ReadEnv;
pub use system::SystemEnv;
