// Keybindings for the gallery window
//
// Keybindings (lightbox only):
// - Left: Previous image
// - Right: Next image
// - Escape: Close the lightbox
//
// While the grid is showing every key falls through to GTK, so scrolling and
// button focus keep their default behaviour.

use gdk4::Key;
use gtk4::prelude::*;
use gtk4::{EventControllerKey, PropagationPhase, Widget};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::viewer::LightboxCommand;

/// Which surface currently owns the keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Grid,
    Lightbox,
}

/// Maps a key to the lightbox command it triggers.
pub fn lightbox_command_for(key: Key) -> Option<LightboxCommand> {
    match key {
        Key::Left | Key::KP_Left => Some(LightboxCommand::Prev),
        Key::Right | Key::KP_Right => Some(LightboxCommand::Next),
        Key::Escape => Some(LightboxCommand::Close),
        _ => None,
    }
}

/// Callback type for lightbox commands
pub type CommandCallback = Box<dyn Fn(LightboxCommand)>;

/// Keybinding manager for the gallery window
pub struct Keybindings {
    controller: EventControllerKey,
    view_mode: Rc<Cell<ViewMode>>,
    on_command: Rc<RefCell<Option<CommandCallback>>>,
}

impl Keybindings {
    pub fn new() -> Self {
        let controller = EventControllerKey::new();
        controller.set_propagation_phase(PropagationPhase::Capture);

        let view_mode = Rc::new(Cell::new(ViewMode::Grid));
        let on_command: Rc<RefCell<Option<CommandCallback>>> = Rc::new(RefCell::new(None));

        let view_mode_clone = view_mode.clone();
        let on_command_clone = on_command.clone();
        controller.connect_key_pressed(move |_controller, keyval, _keycode, _state| {
            if Self::handle_key_press(keyval, view_mode_clone.get(), &on_command_clone) {
                glib::Propagation::Stop
            } else {
                glib::Propagation::Proceed
            }
        });

        Self {
            controller,
            view_mode,
            on_command,
        }
    }

    /// Attach keybindings to a widget (typically the main window)
    pub fn attach(&self, widget: &impl IsA<Widget>) {
        widget.add_controller(self.controller.clone());
    }

    pub fn set_view_mode(&self, mode: ViewMode) {
        self.view_mode.set(mode);
    }

    pub fn connect_command<F>(&self, callback: F)
    where
        F: Fn(LightboxCommand) + 'static,
    {
        *self.on_command.borrow_mut() = Some(Box::new(callback));
    }

    fn handle_key_press(
        keyval: Key,
        mode: ViewMode,
        on_command: &Rc<RefCell<Option<CommandCallback>>>,
    ) -> bool {
        if mode != ViewMode::Lightbox {
            return false;
        }
        let Some(command) = lightbox_command_for(keyval) else {
            return false;
        };
        if let Some(ref callback) = *on_command.borrow() {
            callback(command);
        }
        true
    }
}

impl Default for Keybindings {
    fn default() -> Self {
        Self::new()
    }
}
