//! Channel-backed presenter.
//!
//! Forwards every command the engine issues to whoever owns the receiving
//! end: a renderer task, the simulator's logger, a test.

use purr_core::{PresentationCommand, Presenter};
use tokio::sync::mpsc;
use tracing::trace;

/// Receiving half handed to the renderer.
pub type CommandReceiver = mpsc::UnboundedReceiver<PresentationCommand>;

/// A [`Presenter`] that sends each command down an unbounded channel.
///
/// Sending never blocks, so it is safe to call with the engine lock held.
/// Commands sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelPresenter {
    tx: mpsc::UnboundedSender<PresentationCommand>,
}

impl ChannelPresenter {
    /// A presenter and the receiver for its commands.
    #[must_use]
    pub fn channel() -> (Self, CommandReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Whether anyone is still listening.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        !self.tx.is_closed()
    }

    fn send(&self, command: PresentationCommand) {
        trace!(?command, "presentation command");
        // Receiver gone means nobody is rendering; nothing to do.
        let _ = self.tx.send(command);
    }
}

impl Presenter for ChannelPresenter {
    fn show_coloured_light(&mut self, colour: &str) {
        self.send(PresentationCommand::ShowColouredLight(colour.to_string()));
    }
    fn play_sound(&mut self, name: &str) {
        self.send(PresentationCommand::PlaySound(name.to_string()));
    }
    fn show_thought(&mut self, name: &str) {
        self.send(PresentationCommand::ShowThought(name.to_string()));
    }
    fn hide_thought(&mut self) {
        self.send(PresentationCommand::HideThought);
    }
    fn set_face_expression(&mut self, name: &str) {
        self.send(PresentationCommand::SetFaceExpression(name.to_string()));
    }
    fn tails_emotion(&mut self, name: &str) {
        self.send(PresentationCommand::TailsEmotion(name.to_string()));
    }
    fn hide_light_sphere(&mut self) {
        self.send(PresentationCommand::HideLightSphere);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_arrive_in_order() {
        let (mut presenter, mut rx) = ChannelPresenter::channel();
        presenter.set_face_expression("happy");
        presenter.show_coloured_light("pink");
        presenter.hide_thought();

        assert_eq!(
            rx.try_recv().ok(),
            Some(PresentationCommand::SetFaceExpression("happy".into()))
        );
        assert_eq!(
            rx.try_recv().ok(),
            Some(PresentationCommand::ShowColouredLight("pink".into()))
        );
        assert_eq!(rx.try_recv().ok(), Some(PresentationCommand::HideThought));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_is_harmless() {
        let (mut presenter, rx) = ChannelPresenter::channel();
        drop(rx);
        assert!(!presenter.is_connected());
        presenter.play_sound("happy");
    }
}
