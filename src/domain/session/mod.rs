//! Recording/playback session state machine

pub mod session;

pub use session::{InvalidStateTransition, Session, SessionMode, SessionState, TICK};
