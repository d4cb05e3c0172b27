//! Memo playback adapters

mod rodio_player;

pub use rodio_player::{RodioPlaybackDevice, RodioPlayer};
