use iced::widget::{button, column, container, row, stack, text, Column};
use iced::{Alignment, Element, Length, Task, Theme};
use std::sync::Arc;
use tracing::{debug, info, warn};

mod camera;
mod error;
mod optics;
mod state;
mod ui;

use camera::calibration;
use camera::device::{DeviceId, DeviceSet};
use camera::metadata::ExifFocalReader;
use camera::session;
use camera::still::StillRig;
use error::ViewfinderError;
use state::catalog::{AspectRatioChoice, LensChoice};
use state::controller::{CalibrationOutcome, CaptureRequest, Controller};
use state::settings::Settings;
use state::viewfinder::ViewfinderState;
use ui::preview::{self, PreviewFrame};
use ui::selection::{selection_list, SelectionItem};

/// Main application state
struct LensFinder {
    settings: Settings,
    /// Desktop camera rig built from the settings
    rig: Arc<StillRig>,
    screen: Screen,
    /// Status message to display to the user
    status: String,
}

enum Screen {
    /// Waiting for permission and device discovery
    Opening,
    /// Permission or device error; only the user can fix it
    Blocked(ViewfinderError),
    Live(Live),
}

struct Live {
    controller: Controller,
    preview: Option<iced::widget::image::Handle>,
    /// Bumped for every preview render; older frames are dropped
    preview_generation: u64,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    SessionOpened(Result<DeviceSet, ViewfinderError>),
    LensSelected(f64),
    CropFactorSelected(f64),
    AspectRatioSelected(AspectRatioChoice),
    CalibrationFinished(CalibrationOutcome),
    RetryCalibration,
    /// Preview frame tagged with the generation it was rendered for
    PreviewRendered(u64, Result<PreviewFrame, String>),
    ReloadSettings,
}

impl LensFinder {
    fn new() -> (Self, Task<Message>) {
        Self::with_settings(Settings::load_or_default())
    }

    fn with_settings(settings: Settings) -> (Self, Task<Message>) {
        let rig = Arc::new(StillRig::new(&settings.rig));
        info!("🎨 Lens Finder starting");

        let task = open_session_task(rig.clone());
        (
            LensFinder {
                settings,
                rig,
                screen: Screen::Opening,
                status: "Opening camera...".to_string(),
            },
            task,
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::SessionOpened(Ok(devices)) => {
                let controller = Controller::new(devices, &self.settings);
                self.screen = Screen::Live(Live {
                    controller,
                    preview: None,
                    preview_generation: 0,
                });
                // No readiness has been reported for the initial device yet
                self.advance(None, |controller| Ok(controller.start()))
            }
            Message::SessionOpened(Err(err)) => {
                warn!(%err, "camera session failed");
                self.status = err.to_string();
                self.screen = Screen::Blocked(err);
                Task::none()
            }
            Message::LensSelected(mm) => self.transition(|controller| controller.set_lens(mm)),
            Message::CropFactorSelected(ratio) => {
                self.transition(|controller| controller.set_crop_factor(ratio))
            }
            Message::AspectRatioSelected(aspect) => self.transition(|controller| {
                controller.set_aspect_ratio(aspect);
                Ok(None)
            }),
            Message::CalibrationFinished(outcome) => {
                self.transition(|controller| Ok(controller.finish_calibration(outcome)))
            }
            Message::RetryCalibration => {
                self.transition(|controller| Ok(controller.retry_calibration()))
            }
            Message::PreviewRendered(generation, result) => {
                let Screen::Live(live) = &mut self.screen else {
                    return Task::none();
                };
                if generation != live.preview_generation {
                    debug!(generation, current = live.preview_generation, "dropping stale preview");
                    return Task::none();
                }
                match result {
                    Ok(frame) => {
                        live.preview = Some(iced::widget::image::Handle::from_rgba(
                            frame.width,
                            frame.height,
                            frame.rgba,
                        ));
                    }
                    Err(err) => warn!(%err, "⚠️  Preview failed"),
                }
                Task::none()
            }
            Message::ReloadSettings => {
                self.settings = Settings::load_or_default();
                self.rig = Arc::new(StillRig::new(&self.settings.rig));
                self.screen = Screen::Opening;
                self.status = "Opening camera...".to_string();
                open_session_task(self.rig.clone())
            }
        }
    }

    /// Run one controller transition on the live screen
    fn transition(
        &mut self,
        apply: impl FnOnce(&mut Controller) -> Result<Option<CaptureRequest>, ViewfinderError>,
    ) -> Task<Message> {
        let previous = match &self.screen {
            Screen::Live(live) => live.controller.state().active.id.clone(),
            _ => return Task::none(),
        };
        self.advance(Some(previous), apply)
    }

    /// Apply a transition and schedule its follow-up work
    ///
    /// `previous` is the device whose preview was last reported ready. When the
    /// active device differs, its readiness is reported before any capture.
    fn advance(
        &mut self,
        previous: Option<DeviceId>,
        apply: impl FnOnce(&mut Controller) -> Result<Option<CaptureRequest>, ViewfinderError>,
    ) -> Task<Message> {
        let Screen::Live(live) = &mut self.screen else {
            return Task::none();
        };

        let mut request = match apply(&mut live.controller) {
            Ok(request) => request,
            Err(err) => {
                warn!(%err, "rejected setting");
                self.status = err.to_string();
                return Task::none();
            }
        };

        let active = live.controller.state().active.id.clone();
        if previous.as_ref() != Some(&active) {
            // The still rig has no warm-up; its preview is ready right away
            live.preview = None;
            let ready = live.controller.device_ready(&active);
            request = request.or(ready);
        }

        live.preview_generation += 1;
        let state = live.controller.state();
        self.status = state.status_line();

        let mut tasks = Vec::new();
        if let Some(request) = request {
            tasks.push(capture_task(self.rig.clone(), request));
        }
        tasks.push(preview_task(&self.rig, state, live.preview_generation));

        Task::batch(tasks)
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        match &self.screen {
            Screen::Opening => centered(text(&self.status).size(18).into()),
            Screen::Blocked(err) => {
                let hint = Settings::path()
                    .map(|path| format!("Check {}", path.display()))
                    .unwrap_or_default();

                centered(
                    column![
                        text(err.to_string()).size(18),
                        text(hint).size(14),
                        button("Reload Settings")
                            .on_press(Message::ReloadSettings)
                            .padding(10),
                    ]
                    .spacing(20)
                    .align_x(Alignment::Center)
                    .into(),
                )
            }
            Screen::Live(live) => self.view_live(live),
        }
    }

    fn view_live<'a>(&'a self, live: &'a Live) -> Element<'a, Message> {
        let state = live.controller.state();

        let preview: Element<Message> = match &live.preview {
            Some(handle) => iced::widget::image(handle.clone())
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => centered(text("No preview").size(16).into()),
        };

        let info: Column<Message> = Column::with_children(
            ui::info::info_lines(state)
                .into_iter()
                .map(|line| text(line).size(14).into()),
        );
        let overlay = container(container(info).padding(6).style(container::rounded_box))
            .padding(10)
            .height(Length::Fill)
            .align_bottom(Length::Fill);

        let crop_factors = live
            .controller
            .profiles()
            .iter()
            .map(|profile| SelectionItem::new(profile.label.clone(), profile.crop_factor))
            .collect();
        let aspect_ratios = AspectRatioChoice::ALL
            .iter()
            .map(|&aspect| SelectionItem::new(aspect.label(), aspect))
            .collect();
        let lenses = LensChoice::available(live.controller.devices().has_ultra_wide())
            .into_iter()
            .map(|lens| SelectionItem::new(lens.label(), lens.mm()))
            .collect();

        let mut controls = column![
            selection_list(
                "Crop Factor",
                crop_factors,
                &state.profile.crop_factor,
                Message::CropFactorSelected,
            ),
            selection_list(
                "Aspect Ratio",
                aspect_ratios,
                &state.aspect,
                Message::AspectRatioSelected,
            ),
            selection_list("Lens", lenses, &state.lens.mm(), Message::LensSelected),
            text(&self.status).size(14),
        ]
        .spacing(10);

        if !state.is_calibrated() && !live.controller.capture_in_flight() {
            controls = controls.push(
                button("Retry Calibration")
                    .on_press(Message::RetryCalibration)
                    .padding(10),
            );
        }

        row![
            container(stack![preview, overlay])
                .width(Length::FillPortion(7))
                .height(Length::Fill),
            container(controls).width(Length::FillPortion(3)),
        ]
        .spacing(12)
        .padding(16)
        .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn centered(content: Element<'_, Message>) -> Element<'_, Message> {
    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

fn open_session_task(rig: Arc<StillRig>) -> Task<Message> {
    Task::perform(
        async move { session::open_session(&*rig, &*rig).await },
        Message::SessionOpened,
    )
}

/// Take and read the calibration photo in the background
fn capture_task(rig: Arc<StillRig>, request: CaptureRequest) -> Task<Message> {
    Task::perform(
        async move {
            let reader = ExifFocalReader;
            calibration::calibrate(request, &*rig, &reader).await
        },
        Message::CalibrationFinished,
    )
}

fn preview_task(rig: &StillRig, state: &ViewfinderState, generation: u64) -> Task<Message> {
    match rig.sample_photo(&state.active.id) {
        Some(path) => Task::perform(
            preview::render_preview(path.clone(), state.zoom, state.aspect),
            move |result| Message::PreviewRendered(generation, result),
        ),
        None => Task::none(),
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    iced::application("Lens Finder", LensFinder::update, LensFinder::view)
        .theme(LensFinder::theme)
        .centered()
        .run_with(LensFinder::new)
}
