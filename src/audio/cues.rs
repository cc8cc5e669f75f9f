// Audio cues
// Maps interaction cues to clip files under the configured asset directory

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::backend::Clip;
use crate::currency;

/// A sound the interaction layer asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    /// Spoken name of an accepted denomination
    Denomination(String),

    /// Played after a confirmation added an item to the wallet
    AddedToWallet,

    /// Played after a dismissal; the scanner is ready again
    ReadyForNextScan,

    /// Reminder to swipe, played after the prompt delay
    SwipePrompt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CueConfig {
    /// Root of all clip paths below
    pub asset_dir: PathBuf,

    pub added_to_wallet: Option<String>,

    pub ready_for_next_scan: Option<String>,

    /// No prompt clip ships by default; the prompt is skipped when unset
    pub swipe_prompt: Option<String>,
}

impl Default for CueConfig {
    fn default() -> Self {
        CueConfig {
            asset_dir: PathBuf::from("assets/audio"),
            added_to_wallet: Some("gestures/addprompt.mp3".to_string()),
            ready_for_next_scan: Some("gestures/readyna.mp3".to_string()),
            swipe_prompt: None,
        }
    }
}

impl CueConfig {
    /// Clip for a cue, or None when the cue has no configured sound
    pub fn resolve(&self, cue: &Cue) -> Option<Clip> {
        let (name, relative) = match cue {
            Cue::Denomination(label) => (label.clone(), currency::lookup(label)?.cue.to_string()),
            Cue::AddedToWallet => ("added-to-wallet".to_string(), self.added_to_wallet.clone()?),
            Cue::ReadyForNextScan => (
                "ready-for-next-scan".to_string(),
                self.ready_for_next_scan.clone()?,
            ),
            Cue::SwipePrompt => ("swipe-prompt".to_string(), self.swipe_prompt.clone()?),
        };
        Some(Clip::new(name, self.asset_dir.join(relative)))
    }
}
