pub mod investors;

#[cfg(feature = "server")]
pub mod edits;
#[cfg(feature = "server")]
pub mod uploads;
