//! Container metadata adapters

mod symphonia_decoder;

pub use symphonia_decoder::SymphoniaDecoder;
