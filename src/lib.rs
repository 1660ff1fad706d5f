//! A pure-userland TN3270/TN3270E protocol and screen-emulation library.
//!
//! `telnet` handles framing and option/device-type negotiation, `datastream`
//! decodes and builds 3270 commands/orders, `screen` owns buffer state and
//! field discipline, and `session` drives the whole handshake plus steady
//! state. `printer` and `indfile` are the SCS and IND$FILE subcores for
//! sessions bound to those functions.

/// EBCDIC CP037 character translation.
pub mod ebcdic;

/// Hand-rolled error taxonomy with required per-error context.
pub mod error;

/// Session configuration.
pub mod config;

/// Telnet framing, option negotiation, and the TN3270E header.
pub mod telnet;

/// 3270 command/order parsing and construction.
pub mod datastream;

/// Screen buffer, addressing, and field management.
pub mod screen;

/// Session core and its blocking façade.
pub mod session;

/// The caller-supplied byte-stream transport boundary.
pub mod transport;

/// SCS printer-session decoding.
pub mod printer;

/// IND$FILE file-transfer subcore.
pub mod indfile;

pub use error::{Tn3270Error, Tn3270Result};
pub use session::{blocking::BlockingSession, Session, SessionState};
