//! Database models and queries

pub mod art;
pub mod audio;
pub mod init;
pub mod links;
pub mod migrations;
pub mod repository;

pub use art::{Art, ArtPatch, ArtType, NewArt};
pub use audio::{Audio, AudioPatch, AudioType, NewAudio};
pub use init::*;
pub use links::{add_link, art_for_audio, audio_for_art, remove_link, ArtAudioLink};
pub use migrations::*;
pub use repository::{Entity, HasParent, Repository};
