//! Application layer: the engine session protocol and the services built on it.
//!
//! [`orchestrator::BoletoService`] and [`lookup::CepService`] are the entry
//! points. Both serialize access to their engine and drive one
//! [`session::EngineSession`] per request; replies come back through
//! [`buffer::BufferChannel`].

pub mod buffer;
pub mod lookup;
pub mod orchestrator;
pub mod session;
