//! Error-reporting client
//!
//! The client surface the fixture drives: configuration, event delivery with
//! an interception callback, and background session publishing.

pub mod client;
pub mod config;
pub mod delivery;
pub mod event;
pub mod payload;
pub mod session;

pub use client::{Client, ClientOptions, NotifyOutcome, OnBeforeNotify};
pub use config::{ActiveConfiguration, Configuration, Endpoints};
pub use delivery::{DeliveryRequest, HttpTransport, MemoryTransport, PayloadKind, Transport};
pub use event::{Event, MetaData, StackFrame, Veto};
pub use session::Session;
