//! In-game zone editor: capture sessions, highlight navigation, popups

pub mod highlight;
pub mod inspect;
pub mod popup;
pub mod session;

pub use highlight::Highlights;
pub use inspect::Inspects;
pub use popup::{HighlightChoice, Popup, PopupKind};
pub use session::{AttachTo, EditError, ZonesEdit, EDITOR_STEP_UNITS};
