use std::sync::mpsc;

use eframe::egui;

use crate::cancel::CancelToken;
use crate::config::CleanupConfig;
use crate::engine::{EngineEvent, ExecutionEngine};
use crate::platform::PlatformCapabilities;
use crate::report::{OutcomeStatus, ResultReport};
use crate::task::{ExecutionMode, TaskId};
use crate::utils;

/// Tasks checked when nothing was preselected on the command line.
const DEFAULT_SELECTION: &[TaskId] = &[TaskId::Temp, TaskId::Trash, TaskId::Cache];

/// Per-task checkbox state held by the GUI.
struct TaskRow {
    id: TaskId,
    selected: bool,
    supported: bool,
}

/// Messages sent from the engine thread to the UI thread.
enum BgMessage {
    Event(EngineEvent),
    Finished(ResultReport),
}

#[derive(PartialEq)]
enum AppPhase {
    Idle,
    Running(ExecutionMode),
}

/// Window front end. Owns no cleanup logic: it collects a selection, hands
/// it to the engine on a background thread and renders the report.
pub struct SyscleanApp {
    config: CleanupConfig,
    rows: Vec<TaskRow>,
    phase: AppPhase,
    receiver: Option<mpsc::Receiver<BgMessage>>,
    cancel: Option<CancelToken>,
    finished_tasks: usize,
    running_tasks: usize,
    progress_label: String,
    confirm_visible: bool,
    last_report: Option<(ExecutionMode, ResultReport)>,
    log: Vec<String>,
}

impl SyscleanApp {
    pub fn new(config: CleanupConfig, preselected: &[TaskId]) -> Self {
        let capabilities = *PlatformCapabilities::current(&config.defrag_volume);
        let selection = if preselected.is_empty() {
            DEFAULT_SELECTION
        } else {
            preselected
        };
        let rows = TaskId::ALL
            .into_iter()
            .map(|id| {
                let supported = capabilities.is_supported(id);
                TaskRow {
                    id,
                    selected: supported && selection.contains(&id),
                    supported,
                }
            })
            .collect();

        Self {
            config,
            rows,
            phase: AppPhase::Idle,
            receiver: None,
            cancel: None,
            finished_tasks: 0,
            running_tasks: 0,
            progress_label: String::new(),
            confirm_visible: false,
            last_report: None,
            log: vec![format!("Detected OS: {:?}", capabilities.os())],
        }
    }

    fn selected_ids(&self) -> Vec<TaskId> {
        self.rows
            .iter()
            .filter(|r| r.selected)
            .map(|r| r.id)
            .collect()
    }

    fn start_run(&mut self, mode: ExecutionMode, ctx: &egui::Context) {
        let ids = self.selected_ids();
        self.phase = AppPhase::Running(mode);
        self.confirm_visible = false;
        self.finished_tasks = 0;
        self.running_tasks = ids.len();
        self.progress_label = match mode {
            ExecutionMode::Analyze => "Analyzing...".to_string(),
            ExecutionMode::Execute => "Cleaning...".to_string(),
        };
        self.log.clear();

        let (tx, rx) = mpsc::channel::<BgMessage>();
        self.receiver = Some(rx);
        let cancel = CancelToken::new();
        self.cancel = Some(cancel.clone());

        let events = tx.clone();
        let repaint = ctx.clone();
        let engine = ExecutionEngine::for_host(self.config.clone())
            .with_cancel(cancel)
            .with_observer(move |event| {
                let _ = events.send(BgMessage::Event(event.clone()));
                repaint.request_repaint();
            });

        let repaint = ctx.clone();
        std::thread::spawn(move || {
            let report = engine.run(ids, false, mode);
            let _ = tx.send(BgMessage::Finished(report));
            repaint.request_repaint();
        });
    }

    fn drain_messages(&mut self) {
        let Some(rx) = &self.receiver else {
            return;
        };
        let mut finished = None;
        while let Ok(msg) = rx.try_recv() {
            match msg {
                BgMessage::Event(EngineEvent::TaskStarted(id)) => {
                    self.progress_label = format!("Running: {}", id.label());
                    self.log.push(format!("--- Running task: {} ---", id.label()));
                }
                BgMessage::Event(EngineEvent::TaskFinished { id, status, bytes }) => {
                    self.finished_tasks += 1;
                    self.log.push(format!(
                        "{}: {} ({})",
                        id.label(),
                        status.label(),
                        utils::format_size(bytes)
                    ));
                }
                BgMessage::Finished(report) => finished = Some(report),
            }
        }

        if let Some(report) = finished {
            let AppPhase::Running(mode) = self.phase else {
                return;
            };
            self.log.push(match mode {
                ExecutionMode::Analyze => "Analysis finished.".to_string(),
                ExecutionMode::Execute => "Cleanup process finished.".to_string(),
            });
            self.last_report = Some((mode, report));
            self.phase = AppPhase::Idle;
            self.receiver = None;
            self.cancel = None;
            self.progress_label.clear();
        }
    }

    fn render_header(&self, ui: &mut egui::Ui) {
        ui.add_space(8.0);
        ui.vertical_centered(|ui| {
            ui.heading(
                egui::RichText::new("sysclean")
                    .size(28.0)
                    .strong()
                    .color(egui::Color32::from_rgb(76, 175, 80)),
            );
            ui.label(
                egui::RichText::new("Disk Cleanup Utility")
                    .size(14.0)
                    .color(egui::Color32::GRAY),
            );
        });
        ui.add_space(8.0);
    }

    fn render_task_list(&mut self, ui: &mut egui::Ui) {
        let is_busy = self.phase != AppPhase::Idle;
        ui.label(egui::RichText::new("Cleanup Options").strong());
        for row in &mut self.rows {
            ui.horizontal(|ui| {
                let label = if row.supported {
                    row.id.label().to_string()
                } else {
                    format!("{} (not available on this system)", row.id.label())
                };
                ui.add_enabled(
                    row.supported && !is_busy,
                    egui::Checkbox::new(&mut row.selected, label),
                );
            });
        }
    }

    fn render_action_bar(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        let is_busy = self.phase != AppPhase::Idle;
        let has_selection = self.rows.iter().any(|r| r.selected);

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!is_busy && has_selection, egui::Button::new("Analyze System"))
                .clicked()
            {
                self.start_run(ExecutionMode::Analyze, ctx);
            }

            let can_clean = !is_busy && has_selection;
            if ui
                .add_enabled(
                    can_clean,
                    egui::Button::new(egui::RichText::new("Start Cleanup").color(if can_clean {
                        egui::Color32::from_rgb(220, 60, 60)
                    } else {
                        egui::Color32::GRAY
                    })),
                )
                .clicked()
            {
                self.confirm_visible = true;
            }

            if is_busy {
                if ui.button("Cancel").clicked() {
                    if let Some(cancel) = &self.cancel {
                        cancel.cancel();
                        self.progress_label = "Cancelling...".to_string();
                    }
                }
                ui.add_space(8.0);
                ui.spinner();
                ui.label(&self.progress_label);
            }
        });

        if is_busy && self.running_tasks > 0 {
            let fraction = self.finished_tasks as f32 / self.running_tasks as f32;
            ui.add(egui::ProgressBar::new(fraction).show_percentage());
        }
        ui.add_space(4.0);
    }

    fn render_report(&self, ui: &mut egui::Ui) {
        let Some((mode, report)) = &self.last_report else {
            ui.label(
                egui::RichText::new("Select tasks, then Analyze or Start Cleanup.")
                    .italics()
                    .color(egui::Color32::GRAY),
            );
            return;
        };

        let title = match mode {
            ExecutionMode::Analyze => "Analysis Report",
            ExecutionMode::Execute => "Cleanup Report",
        };
        ui.label(egui::RichText::new(title).strong());

        for outcome in report.outcomes() {
            ui.horizontal(|ui| {
                let color = match outcome.status {
                    OutcomeStatus::Succeeded => egui::Color32::from_rgb(80, 200, 80),
                    OutcomeStatus::Partial => egui::Color32::from_rgb(220, 180, 50),
                    OutcomeStatus::Failed => egui::Color32::from_rgb(220, 60, 60),
                    OutcomeStatus::Skipped | OutcomeStatus::Cancelled => egui::Color32::GRAY,
                };
                ui.label(egui::RichText::new(outcome.id.label()).strong());
                ui.label(egui::RichText::new(outcome.status.label()).color(color));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        egui::RichText::new(utils::format_size(outcome.bytes))
                            .color(egui::Color32::from_rgb(220, 180, 50)),
                    );
                });
            });
            if let Some(message) = &outcome.message {
                ui.label(
                    egui::RichText::new(message)
                        .small()
                        .color(egui::Color32::from_rgb(160, 160, 170)),
                );
            }
            if outcome.id == TaskId::LargeOld {
                for entry in &outcome.entries {
                    ui.label(
                        egui::RichText::new(format!(
                            "Found: {} ({})",
                            utils::display_path(&entry.path),
                            utils::format_size(entry.size_bytes)
                        ))
                        .small(),
                    );
                }
            }
            if !outcome.errors.is_empty() {
                egui::CollapsingHeader::new(
                    egui::RichText::new(format!("Warnings ({})", outcome.errors.len()))
                        .color(egui::Color32::from_rgb(220, 150, 50)),
                )
                .id_salt(outcome.id.as_str())
                .default_open(false)
                .show(ui, |ui| {
                    for err in &outcome.errors {
                        ui.label(
                            egui::RichText::new(err.to_string())
                                .color(egui::Color32::from_rgb(220, 100, 50)),
                        );
                    }
                });
            }
        }

        ui.separator();
        let total_label = match mode {
            ExecutionMode::Analyze => "Total potential space savings:",
            ExecutionMode::Execute => "Total space freed:",
        };
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(total_label).strong());
            ui.label(
                egui::RichText::new(utils::format_size(report.total_bytes()))
                    .strong()
                    .size(16.0)
                    .color(egui::Color32::from_rgb(80, 200, 80)),
            );
        });
    }

    fn render_log(&self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Action Log")
            .default_open(false)
            .show(ui, |ui| {
                for line in &self.log {
                    ui.label(egui::RichText::new(line).monospace().small());
                }
            });
    }

    fn render_confirm_dialog(&mut self, ctx: &egui::Context) {
        let mut should_clean = false;
        let mut should_cancel = false;
        let labels: Vec<&'static str> = self
            .rows
            .iter()
            .filter(|r| r.selected)
            .map(|r| r.id.label())
            .collect();

        egui::Window::new("Confirm Cleanup")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .fixed_size([360.0, 0.0])
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                ui.label("The following tasks will run and may permanently delete files:");
                ui.add_space(6.0);
                egui::Frame::group(ui.style())
                    .inner_margin(8.0)
                    .show(ui, |ui| {
                        for label in &labels {
                            ui.label(format!("\u{2022} {label}"));
                        }
                    });
                ui.add_space(4.0);
                ui.label(
                    egui::RichText::new("This action cannot be undone.")
                        .small()
                        .color(egui::Color32::from_rgb(200, 100, 100)),
                );
                ui.add_space(8.0);
                ui.columns(2, |cols| {
                    cols[0].vertical_centered(|ui| {
                        if ui.add_sized([140.0, 32.0], egui::Button::new("Cancel")).clicked() {
                            should_cancel = true;
                        }
                    });
                    cols[1].vertical_centered(|ui| {
                        if ui
                            .add_sized(
                                [140.0, 32.0],
                                egui::Button::new(
                                    egui::RichText::new("Start Cleanup")
                                        .strong()
                                        .color(egui::Color32::WHITE),
                                )
                                .fill(egui::Color32::from_rgb(200, 50, 50)),
                            )
                            .clicked()
                        {
                            should_clean = true;
                        }
                    });
                });
            });

        if should_cancel {
            self.confirm_visible = false;
        }
        if should_clean {
            self.start_run(ExecutionMode::Execute, ctx);
        }
    }
}

impl eframe::App for SyscleanApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_messages();

        if self.phase != AppPhase::Idle {
            ctx.request_repaint();
        }

        if self.confirm_visible {
            self.render_confirm_dialog(ctx);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_header(ui);
            self.render_task_list(ui);
            ui.separator();
            self.render_action_bar(ui, ctx);
            ui.separator();
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    self.render_report(ui);
                    ui.add_space(8.0);
                    self.render_log(ui);
                });
        });
    }
}
