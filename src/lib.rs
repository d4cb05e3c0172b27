//! VoiceMemo - on-device voice memo recorder and player
//!
//! Records microphone audio into FLAC files in a flat directory, lists them
//! newest first, plays them back one at a time and deletes them. A single
//! session owns the audio device, so recording and playback never overlap.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: Memo values, the session state machine, configuration
//! - **Application**: Use cases (catalog, metadata, session) and port interfaces (traits)
//! - **Infrastructure**: Adapter implementations (cpal, rodio, symphonia, filesystem, etc.)
//! - **CLI**: Argument parsing, interactive shell and output formatting

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
