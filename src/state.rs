use crate::{
    duration::{parse_duration, DurationError, DurationInput},
    song::{format_duration, CoverSource, SongInfo},
};

pub const INITIAL_POSITION: u32 = 60 + 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextField {
    Name,
    Singer,
    Album,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardEvent {
    Seek(u32),
    TogglePlayback,
    Previous,
    Next,
    OpenDurationEditor,
    DurationTyped(String),
    DurationBackspace,
    CommitDuration,
    EditText(TextField, String),
    CoverLoaded(CoverSource),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    Ignored,
    Changed,
    DurationSet(u32),
    DurationReverted(DurationError),
}

#[derive(Debug, Clone)]
pub struct CardState {
    pub song: SongInfo,
    pub position: u32,
    pub paused: bool,
    pub duration_editor_open: bool,
    pub duration_input: DurationInput,
    default_duration: u32,
}

impl Default for CardState {
    fn default() -> Self {
        Self::new(SongInfo::default())
    }
}

impl CardState {
    /// Starts the card on `default_song`; its duration is also the text the
    /// duration editor falls back to on invalid input.
    pub fn new(default_song: SongInfo) -> Self {
        let default_duration = default_song.duration;
        Self {
            position: INITIAL_POSITION.min(default_song.duration),
            paused: false,
            duration_editor_open: false,
            duration_input: DurationInput::new(format_duration(default_duration)),
            song: default_song,
            default_duration,
        }
    }

    pub fn default_duration(&self) -> u32 {
        self.default_duration
    }

    pub fn remaining(&self) -> u32 {
        self.song.duration.saturating_sub(self.position)
    }

    pub fn apply(&mut self, event: CardEvent) -> Applied {
        match event {
            CardEvent::Seek(position) => {
                let position = position.min(self.song.duration);
                if position == self.position {
                    return Applied::Ignored;
                }
                self.position = position;
                Applied::Changed
            }
            CardEvent::TogglePlayback => {
                self.paused = !self.paused;
                Applied::Changed
            }
            // The card has no playlist behind it.
            CardEvent::Previous | CardEvent::Next => Applied::Ignored,
            CardEvent::OpenDurationEditor => {
                if self.duration_editor_open {
                    return Applied::Ignored;
                }
                self.duration_editor_open = true;
                Applied::Changed
            }
            CardEvent::DurationTyped(text) => {
                if !self.duration_editor_open {
                    return Applied::Ignored;
                }
                if self.duration_input.push_str(&text) {
                    Applied::Changed
                } else {
                    Applied::Ignored
                }
            }
            CardEvent::DurationBackspace => {
                if self.duration_editor_open && self.duration_input.backspace() {
                    Applied::Changed
                } else {
                    Applied::Ignored
                }
            }
            CardEvent::CommitDuration => {
                if !self.duration_editor_open {
                    return Applied::Ignored;
                }
                self.duration_editor_open = false;
                match parse_duration(self.duration_input.text()) {
                    Ok(duration) => {
                        self.song.duration = duration;
                        self.position = self.position.min(duration);
                        Applied::DurationSet(duration)
                    }
                    Err(err) => {
                        self.duration_input
                            .set(format_duration(self.default_duration));
                        Applied::DurationReverted(err)
                    }
                }
            }
            CardEvent::EditText(field, value) => {
                let slot = match field {
                    TextField::Name => &mut self.song.name,
                    TextField::Singer => &mut self.song.singer,
                    TextField::Album => &mut self.song.album,
                };
                if *slot == value {
                    return Applied::Ignored;
                }
                *slot = value;
                Applied::Changed
            }
            CardEvent::CoverLoaded(source) => {
                self.song.image = source;
                Applied::Changed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn open_with(state: &mut CardState, text: &str) {
        state.apply(CardEvent::OpenDurationEditor);
        state.duration_input.set("");
        state.apply(CardEvent::DurationTyped(text.to_string()));
    }

    #[test]
    fn starts_with_card_defaults() {
        let state = CardState::default();
        assert_eq!(state.position, 68);
        assert!(!state.paused);
        assert!(!state.duration_editor_open);
        assert_eq!(state.duration_input.text(), "4:30");
        assert_eq!(state.remaining(), 270 - 68);
    }

    #[test]
    fn seek_clamps_to_duration() {
        let mut state = CardState::default();
        assert_eq!(state.apply(CardEvent::Seek(1_000)), Applied::Changed);
        assert_eq!(state.position, 270);
        assert_eq!(state.apply(CardEvent::Seek(270)), Applied::Ignored);
    }

    #[test]
    fn toggle_flips_paused() {
        let mut state = CardState::default();
        state.apply(CardEvent::TogglePlayback);
        assert!(state.paused);
        state.apply(CardEvent::TogglePlayback);
        assert!(!state.paused);
        assert_eq!(state.apply(CardEvent::Next), Applied::Ignored);
    }

    #[test]
    fn valid_commit_sets_duration_and_closes() {
        let mut state = CardState::default();
        open_with(&mut state, "1305");
        assert_eq!(state.duration_input.text(), "13:05");
        assert_eq!(
            state.apply(CardEvent::CommitDuration),
            Applied::DurationSet(13 * 60 + 5)
        );
        assert_eq!(state.song.duration, 785);
        assert!(!state.duration_editor_open);
        assert_eq!(state.duration_input.text(), "13:05");
    }

    #[test]
    fn shorter_duration_pulls_position_back() {
        let mut state = CardState::default();
        open_with(&mut state, "0:30");
        state.apply(CardEvent::CommitDuration);
        assert_eq!(state.song.duration, 30);
        assert_eq!(state.position, 30);
        assert_eq!(state.remaining(), 0);
    }

    #[test]
    fn invalid_commit_reverts_to_default_text() {
        let mut state = CardState::default();
        open_with(&mut state, "2:00");
        state.apply(CardEvent::CommitDuration);
        assert_eq!(state.song.duration, 120);

        open_with(&mut state, "12:");
        state.apply(CardEvent::DurationTyped("7".into()));
        state.apply(CardEvent::DurationTyped("9".into()));
        assert_eq!(state.duration_input.text(), "12:79");
        let applied = state.apply(CardEvent::CommitDuration);
        assert!(matches!(applied, Applied::DurationReverted(_)));
        // Falls back to the default song, not the last accepted value.
        assert_eq!(state.duration_input.text(), "4:30");
        assert_eq!(state.song.duration, 120);
    }

    #[test]
    fn commit_without_separator_reverts() {
        let mut state = CardState::default();
        open_with(&mut state, "7");
        let applied = state.apply(CardEvent::CommitDuration);
        assert!(matches!(
            applied,
            Applied::DurationReverted(DurationError::Separator(_))
        ));
        assert_eq!(state.duration_input.text(), "4:30");
    }

    #[test]
    fn typing_ignored_while_editor_closed() {
        let mut state = CardState::default();
        assert_eq!(
            state.apply(CardEvent::DurationTyped("1".into())),
            Applied::Ignored
        );
        assert_eq!(state.apply(CardEvent::DurationBackspace), Applied::Ignored);
        assert_eq!(state.apply(CardEvent::CommitDuration), Applied::Ignored);
        assert_eq!(state.duration_input.text(), "4:30");
    }

    #[test]
    fn backspace_edits_open_editor() {
        let mut state = CardState::default();
        state.apply(CardEvent::OpenDurationEditor);
        state.apply(CardEvent::DurationBackspace);
        assert_eq!(state.duration_input.text(), "4:3");
    }

    #[test]
    fn text_edits_land_in_song() {
        let mut state = CardState::default();
        state.apply(CardEvent::EditText(TextField::Name, "Waiting".into()));
        state.apply(CardEvent::EditText(TextField::Album, "EP".into()));
        assert_eq!(state.song.name, "Waiting");
        assert_eq!(state.song.album, "EP");
        assert_eq!(
            state.apply(CardEvent::EditText(TextField::Album, "EP".into())),
            Applied::Ignored
        );
    }

    #[test]
    fn cover_swap_replaces_source() {
        let mut state = CardState::default();
        let picked = CoverSource::Picked {
            path: PathBuf::from("/tmp/cover.png"),
        };
        state.apply(CardEvent::CoverLoaded(picked.clone()));
        assert_eq!(state.song.image, picked);
    }

    #[test]
    fn short_default_song_clamps_initial_position() {
        let song = SongInfo {
            duration: 30,
            ..SongInfo::default()
        };
        let state = CardState::new(song);
        assert_eq!(state.position, 30);
        assert_eq!(state.duration_input.text(), "0:30");
    }
}
