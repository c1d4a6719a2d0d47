// Services module - remote lookups and notifications

pub mod lookup;
pub mod plex;
pub mod youtube;
