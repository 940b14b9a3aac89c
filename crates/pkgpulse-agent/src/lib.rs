#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

//! A2A agent runtime for pkgpulse.
//!
//! Wires the analysis core to the outside world:
//! - `handler` decodes JSON-RPC envelopes, routes intent, and builds task
//!   results
//! - `history` keeps per-context conversation logs in process memory
//! - `server` exposes the agent over HTTP (`POST /a2a`)
//! - `logging` owns tracing setup so the library crates stay quiet

pub mod handler;
pub mod history;
pub mod logging;
pub mod server;

pub use handler::{check_envelope, extract_text, route_intent, AgentHandler, Intent, HELP_TEXT};
pub use history::{ConversationStore, InMemoryConversations};
pub use server::{router, serve};
