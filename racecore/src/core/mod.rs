pub mod circuit;
pub mod competitor;
pub mod driver;
pub mod event_log;
pub mod handle_race;
pub mod race;
pub mod race_event;
pub mod tireset;
