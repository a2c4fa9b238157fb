//! # Main Display Module
//!
//! The whole window: the current note on three lines and a close button.

use iced::widget::{button, column, container, text};
use iced::{Element, Length};

/// Font size of the note label.
const NOTE_TEXT_SIZE: f32 = 40.0;

/// Creates the complete main application view.
///
/// # Arguments
/// * `label` - Multi-line note text, already split for display
/// * `audio_active` - false once the worker has stopped delivering estimates
/// * `close_message` - Message sent by the close button
pub fn create_main_view(
    label: &str,
    audio_active: bool,
    close_message: crate::Message,
) -> Element<'static, crate::Message> {
    let note_text = if audio_active {
        label.to_string()
    } else {
        format!("{label}\n(no audio input)")
    };

    let note_panel = container(text(note_text).size(NOTE_TEXT_SIZE))
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill);

    let close_button = button(text("Close"))
        .on_press(close_message)
        .width(Length::Fill);

    column![note_panel, close_button]
        .spacing(10)
        .padding(10)
        .into()
}
