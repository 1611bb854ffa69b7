//! Limit zones - zone-based movement restrictions for game servers
//!
//! Zones are axis-aligned boxes stored per map. Each one is backed by an
//! engine trigger volume; players touching it get the zone's effects
//! (jump/duck suppression, speed cap, teleport, boost). Editors create,
//! inspect and modify zones in game through commands and popups.
//!
//! The engine is reached through [`host::Host`]. The bundled binary bridges
//! it over a WebSocket connection.

pub mod app;
pub mod config;
pub mod editor;
pub mod game;
pub mod host;
pub mod http;
pub mod plugin;
pub mod util;
pub mod ws;
pub mod zone;
