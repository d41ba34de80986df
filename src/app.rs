use gtk4::prelude::*;
use gtk4::Application;
use std::rc::Rc;
use tracing::error;

use crate::config::GalleryConfig;
use crate::ui::GalleryWindow;

const APP_ID: &str = "io.gallerow.Gallery";

pub struct GalleryApp {
    app: Application,
}

impl GalleryApp {
    pub fn new(config: GalleryConfig) -> Self {
        let app = Application::builder()
            .application_id(APP_ID)
            .flags(gio::ApplicationFlags::NON_UNIQUE)
            .build();

        let config = Rc::new(config);
        app.connect_activate(move |app| Self::on_activate(app, &config));

        Self { app }
    }

    /// Runs the main loop. Command-line arguments are consumed by
    /// `GalleryConfig`, so GTK only sees the program name.
    pub fn run(&self) -> i32 {
        let args: [&str; 1] = ["gallerow"];
        self.app.run_with_args(&args[..]).into()
    }

    fn on_activate(app: &Application, config: &GalleryConfig) {
        match GalleryWindow::new(app, config) {
            Ok(window) => {
                window.present();
                // Keep the window alive by storing it on the Application.
                unsafe {
                    app.set_data("main-window", window);
                }
            }
            Err(e) => {
                error!(error = ?e, "Failed to build gallery window");
                app.quit();
            }
        }
    }
}
