//! Popup documents sent to editors. Text is given as localisation keys plus
//! tokens; the host renders them.

use serde::Serialize;

use crate::util::vector::Vector;
use crate::zone::Zone;

/// Shown for an unset vector property
const UNSET: &str = "- - -";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopupKind {
    Highlight,
    DeleteConfirm,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "line", rename_all = "snake_case")]
pub enum PopupLine {
    Option { choice: u8, text: &'static str },
    Text { text: &'static str, tokens: Vec<(&'static str, String)> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub kind: PopupKind,
    pub lines: Vec<PopupLine>,
}

/// Options of the highlight popup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightChoice {
    Next,
    Prev,
    Delete,
    ToggleNojump,
    ToggleNoduck,
}

impl HighlightChoice {
    pub fn choice(self) -> u8 {
        match self {
            HighlightChoice::Next => 1,
            HighlightChoice::Prev => 2,
            HighlightChoice::Delete => 3,
            HighlightChoice::ToggleNojump => 4,
            HighlightChoice::ToggleNoduck => 5,
        }
    }

    pub fn from_choice(choice: u8) -> Option<Self> {
        match choice {
            1 => Some(HighlightChoice::Next),
            2 => Some(HighlightChoice::Prev),
            3 => Some(HighlightChoice::Delete),
            4 => Some(HighlightChoice::ToggleNojump),
            5 => Some(HighlightChoice::ToggleNoduck),
            _ => None,
        }
    }
}

pub const DELETE_NO: u8 = 1;
pub const DELETE_YES: u8 = 2;

fn option(choice: u8, text: &'static str) -> PopupLine {
    PopupLine::Option { choice, text }
}

fn vector_or_unset(vector: Option<Vector>) -> String {
    vector.map(|v| v.to_string()).unwrap_or_else(|| UNSET.to_string())
}

impl Popup {
    /// Navigation and property summary for the highlighted zone, if any
    pub fn highlight(zone: Option<&Zone>) -> Self {
        let mut lines = vec![
            option(HighlightChoice::Next.choice(), "popup highlight next_zone"),
            option(HighlightChoice::Prev.choice(), "popup highlight prev_zone"),
        ];

        match zone {
            None => lines.push(PopupLine::Text {
                text: "popup highlight current_zone none",
                tokens: Vec::new(),
            }),
            Some(zone) => {
                let p = &zone.properties;
                lines.push(PopupLine::Text {
                    text: "popup highlight current_zone",
                    tokens: vec![
                        ("nojump", p.nojump.to_string()),
                        ("noduck", p.noduck.to_string()),
                        (
                            "speed_cap",
                            p.speed_cap.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
                        ),
                        ("teleport_origin", vector_or_unset(p.teleport.origin)),
                        ("teleport_angles", vector_or_unset(p.teleport.angles)),
                        ("boost", vector_or_unset(p.boost)),
                    ],
                });
                lines.push(option(HighlightChoice::Delete.choice(), "popup highlight delete"));
                lines.push(option(
                    HighlightChoice::ToggleNojump.choice(),
                    "popup highlight toggle_nojump",
                ));
                lines.push(option(
                    HighlightChoice::ToggleNoduck.choice(),
                    "popup highlight toggle_noduck",
                ));
            }
        }

        Self {
            kind: PopupKind::Highlight,
            lines,
        }
    }

    /// Yes/no confirmation before deleting the highlighted zone
    pub fn delete_confirm() -> Self {
        Self {
            kind: PopupKind::DeleteConfirm,
            lines: vec![
                PopupLine::Text {
                    text: "popup delete title",
                    tokens: Vec::new(),
                },
                option(DELETE_NO, "popup delete no"),
                option(DELETE_YES, "popup delete yes"),
            ],
        }
    }

    pub fn token(&self, name: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            PopupLine::Text { tokens, .. } => tokens
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| value.as_str()),
            PopupLine::Option { .. } => None,
        })
    }

    pub fn choices(&self) -> Vec<u8> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                PopupLine::Option { choice, .. } => Some(*choice),
                PopupLine::Text { .. } => None,
            })
            .collect()
    }
}
