pub mod audio_worker;
pub mod cli;
pub mod error;
pub mod logging;
pub mod player;
pub mod settings;
