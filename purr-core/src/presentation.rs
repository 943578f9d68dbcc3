//! Presentation seam.
//!
//! The engine never renders anything itself. It issues named commands to a
//! [`Presenter`]; the face mesh, light sphere, thought bubble, tail and
//! speaker live behind it.

use serde::{Deserialize, Serialize};

/// Receiver for outbound presentation commands.
pub trait Presenter {
    /// Colour the light sphere.
    fn show_coloured_light(&mut self, colour: &str);
    /// Play a named sound.
    fn play_sound(&mut self, name: &str);
    /// Pop up a thought bubble with a named icon.
    fn show_thought(&mut self, name: &str);
    /// Hide the thought bubble.
    fn hide_thought(&mut self);
    /// Set the face to a named expression.
    fn set_face_expression(&mut self, name: &str);
    /// Play a named tail animation.
    fn tails_emotion(&mut self, name: &str);
    /// Turn the light sphere off.
    fn hide_light_sphere(&mut self);
}

/// One outbound command, as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", content = "name", rename_all = "snake_case")]
pub enum PresentationCommand {
    /// `show_coloured_light(colour)`
    ShowColouredLight(String),
    /// `play_sound(name)`
    PlaySound(String),
    /// `show_thought(name)`
    ShowThought(String),
    /// `hide_thought()`
    HideThought,
    /// `set_face_expression(name)`
    SetFaceExpression(String),
    /// `tails_emotion(name)`
    TailsEmotion(String),
    /// `hide_light_sphere()`
    HideLightSphere,
}

impl PresentationCommand {
    /// Replay this command onto a presenter.
    pub fn apply<P: Presenter + ?Sized>(&self, presenter: &mut P) {
        match self {
            Self::ShowColouredLight(c) => presenter.show_coloured_light(c),
            Self::PlaySound(n) => presenter.play_sound(n),
            Self::ShowThought(n) => presenter.show_thought(n),
            Self::HideThought => presenter.hide_thought(),
            Self::SetFaceExpression(n) => presenter.set_face_expression(n),
            Self::TailsEmotion(n) => presenter.tails_emotion(n),
            Self::HideLightSphere => presenter.hide_light_sphere(),
        }
    }
}

/// Presenter that records every command in order.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    commands: Vec<PresentationCommand>,
}

impl CommandLog {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn commands(&self) -> &[PresentationCommand] {
        &self.commands
    }

    /// Take the recorded commands, leaving the log empty.
    pub fn drain(&mut self) -> Vec<PresentationCommand> {
        std::mem::take(&mut self.commands)
    }

    /// The most recent face set, if any.
    #[must_use]
    pub fn last_face(&self) -> Option<&str> {
        self.commands.iter().rev().find_map(|c| match c {
            PresentationCommand::SetFaceExpression(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Whether `command` was recorded.
    #[must_use]
    pub fn contains(&self, command: &PresentationCommand) -> bool {
        self.commands.contains(command)
    }
}

impl Presenter for CommandLog {
    fn show_coloured_light(&mut self, colour: &str) {
        self.commands.push(PresentationCommand::ShowColouredLight(colour.to_string()));
    }
    fn play_sound(&mut self, name: &str) {
        self.commands.push(PresentationCommand::PlaySound(name.to_string()));
    }
    fn show_thought(&mut self, name: &str) {
        self.commands.push(PresentationCommand::ShowThought(name.to_string()));
    }
    fn hide_thought(&mut self) {
        self.commands.push(PresentationCommand::HideThought);
    }
    fn set_face_expression(&mut self, name: &str) {
        self.commands.push(PresentationCommand::SetFaceExpression(name.to_string()));
    }
    fn tails_emotion(&mut self, name: &str) {
        self.commands.push(PresentationCommand::TailsEmotion(name.to_string()));
    }
    fn hide_light_sphere(&mut self) {
        self.commands.push(PresentationCommand::HideLightSphere);
    }
}
