use chrono::{Duration, Local, NaiveDate};
use eframe::egui;
use egui::{Color32, RichText};
use std::sync::mpsc::{channel, Receiver, Sender};

use crate::config::{Config, ViewMode};
use crate::export;
use crate::schedule::{
    add_months, build_day_grid, build_month, build_project_groups, month_anchor, weekday_index,
    ExpandState, Instant, ItemKind, RawDate, RescheduleCommit, RescheduleCoordinator,
    SchedulableItem, SlotRef, TimelineWindow,
};
use crate::store::{NewTask, Snapshot, Store};
use super::{theme, views};

pub struct TempoApp {
    config: Config,

    // Data - refreshed from the store after every mutation
    store: Option<Store>,
    snapshot: Snapshot,

    // Navigation state per view
    month_anchor: NaiveDate,
    focus_day: NaiveDate,
    window: TimelineWindow,

    // Pure UI state layered on the engine
    coordinator: RescheduleCoordinator,
    expand: ExpandState,

    // New-block dialog
    show_new_block: bool,
    new_block_title: String,
    new_block_slot: SlotRef,

    // Status
    status_message: Option<(String, bool)>, // (message, is_error)
    loading: bool,

    // Async communication
    runtime: tokio::runtime::Runtime,
    result_rx: Receiver<AsyncResult>,
    result_tx: Sender<AsyncResult>,
}

enum AsyncResult {
    SnapshotLoaded(Snapshot),
    MutationDone(String),
    Error(String),
}

impl TempoApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = Config::load().unwrap_or_default();
        theme::setup_fonts(&cc.egui_ctx);
        theme::setup_theme(&cc.egui_ctx);
        cc.egui_ctx.set_zoom_factor(config.font_scale);

        let runtime = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
        let (result_tx, result_rx) = channel();

        let today = Local::now().date_naive();
        let timeline_days = config.timeline_days;

        let mut status_message = None;
        let store = match Store::open() {
            Ok(store) => Some(store),
            Err(e) => {
                log::error!("failed to open document store: {e}");
                status_message = Some((format!("Store unavailable: {e}"), true));
                None
            }
        };

        let mut app = Self {
            config,
            store,
            snapshot: Snapshot::default(),
            month_anchor: month_anchor(today),
            focus_day: today,
            window: TimelineWindow::new(today - Duration::days(7), timeline_days),
            coordinator: RescheduleCoordinator::new(),
            expand: ExpandState::new(),
            show_new_block: false,
            new_block_title: String::new(),
            new_block_slot: SlotRef { hour: 9, minute: 0 },
            status_message,
            loading: false,
            runtime,
            result_rx,
            result_tx,
        };

        app.refresh_snapshot();
        app
    }

    fn check_async_results(&mut self) {
        while let Ok(result) = self.result_rx.try_recv() {
            match result {
                AsyncResult::SnapshotLoaded(snapshot) => {
                    self.snapshot = snapshot;
                    self.loading = false;
                }
                AsyncResult::MutationDone(msg) => {
                    self.status_message = Some((msg, false));
                    // The snapshot reload is the "subscription" delivering
                    // the updated entities; nothing was mutated locally.
                    self.refresh_snapshot();
                }
                AsyncResult::Error(msg) => {
                    log::warn!("store operation failed: {msg}");
                    self.status_message = Some((msg, true));
                    self.loading = false;
                }
            }
        }
    }

    fn refresh_snapshot(&mut self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        self.loading = true;
        let tx = self.result_tx.clone();
        self.runtime.spawn(async move {
            match store.load_snapshot() {
                Ok(snapshot) => {
                    let _ = tx.send(AsyncResult::SnapshotLoaded(snapshot));
                }
                Err(e) => {
                    let _ = tx.send(AsyncResult::Error(format!("Load failed: {e}")));
                }
            }
        });
    }

    /// Dispatch the single mutation a completed drag produced. Transient
    /// drag state is already cleared by the coordinator, so a failure here
    /// leaves nothing stale - the unchanged snapshot simply stays on screen.
    fn commit_reschedule(&mut self, commit: RescheduleCommit) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let tx = self.result_tx.clone();
        self.runtime.spawn(async move {
            match store.reschedule_task(commit.item_id, RawDate::from(commit.new_start)) {
                Ok(()) => {
                    let _ = tx.send(AsyncResult::MutationDone("Rescheduled".to_string()));
                }
                Err(e) => {
                    let _ = tx.send(AsyncResult::Error(format!("Reschedule failed: {e}")));
                }
            }
        });
    }

    fn toggle_done(&mut self, item: SchedulableItem) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let tx = self.result_tx.clone();
        let date = self.focus_day;
        self.runtime.spawn(async move {
            let result = match item.kind {
                ItemKind::Task => store.set_task_completed(item.id, !item.completed),
                ItemKind::Habit => store.mark_habit_done(item.id, date, !item.completed),
            };
            match result {
                Ok(()) => {
                    let msg = if item.completed {
                        format!("Reopened '{}'", item.title)
                    } else {
                        format!("Completed '{}'", item.title)
                    };
                    let _ = tx.send(AsyncResult::MutationDone(msg));
                }
                Err(e) => {
                    let _ = tx.send(AsyncResult::Error(format!("Update failed: {e}")));
                }
            }
        });
    }

    fn create_block(&mut self) {
        let Some(store) = self.store.clone() else {
            return;
        };
        let title = if self.new_block_title.trim().is_empty() {
            "New block".to_string()
        } else {
            self.new_block_title.trim().to_string()
        };
        let slot = self.new_block_slot;
        let start = Instant::at(self.focus_day, slot.hour as u32, slot.minute as u32);
        let tx = self.result_tx.clone();
        self.runtime.spawn(async move {
            let new_task = NewTask {
                title: title.clone(),
                project_id: None,
                milestone_id: None,
                due: None,
                scheduled_start: Some(start),
                duration_minutes: Some(60),
                priority: Default::default(),
            };
            match store.create_task(new_task) {
                Ok(_) => {
                    let _ = tx.send(AsyncResult::MutationDone(format!("Added '{}'", title)));
                }
                Err(e) => {
                    let _ = tx.send(AsyncResult::Error(format!("Create failed: {e}")));
                }
            }
        });
    }

    fn export_focus_week(&mut self) {
        let week_start = self.focus_day - Duration::days(weekday_index(self.focus_day) as i64);
        match export::export_week(week_start, &self.snapshot.tasks, &self.snapshot.habits) {
            Ok(path) => {
                self.status_message = Some((format!("Exported to {}", path.display()), false));
            }
            Err(e) => {
                self.status_message = Some((format!("Export failed: {}", e), true));
            }
        }
    }

    fn navigate(&mut self, direction: i32) {
        match self.config.view_mode {
            ViewMode::Month => {
                self.month_anchor = add_months(self.month_anchor, direction);
            }
            ViewMode::Day => {
                self.focus_day += Duration::days(direction as i64);
            }
            ViewMode::Timeline => {
                self.window.shift(direction as i64 * 7);
            }
        }
    }

    fn jump_to_today(&mut self) {
        let today = Local::now().date_naive();
        self.month_anchor = month_anchor(today);
        self.focus_day = today;
        self.window = TimelineWindow::new(today - Duration::days(7), self.config.timeline_days);
    }

    fn nav_label(&self) -> String {
        match self.config.view_mode {
            ViewMode::Month => self.month_anchor.format("%B %Y").to_string(),
            ViewMode::Day => self.focus_day.format("%a, %b %-d").to_string(),
            ViewMode::Timeline => {
                let end = self.window.date_at(self.window.days.saturating_sub(1));
                format!(
                    "{} - {}",
                    self.window.start.format("%b %-d"),
                    end.format("%b %-d, %Y")
                )
            }
        }
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            // Pill-shaped navigation, shared by all three views
            let (button_bg, button_text) = theme::button_colors();
            egui::Frame::none()
                .fill(button_bg)
                .rounding(egui::Rounding::same(12.0))
                .inner_margin(egui::Margin::symmetric(8.0, 4.0))
                .show(ui, |ui| {
                    ui.horizontal(|ui| {
                        let left_arrow = ui.add(egui::Label::new(
                            RichText::new(egui_phosphor::regular::CARET_LEFT)
                                .size(14.0)
                                .color(button_text),
                        ).sense(egui::Sense::click()));
                        if left_arrow.hovered() {
                            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                        }
                        if left_arrow.clicked() {
                            self.navigate(-1);
                        }

                        ui.add_space(4.0);

                        ui.allocate_ui_with_layout(
                            egui::vec2(140.0, 14.0),
                            egui::Layout::centered_and_justified(egui::Direction::LeftToRight),
                            |ui| {
                                ui.label(
                                    RichText::new(self.nav_label()).size(14.0).color(button_text),
                                );
                            },
                        );

                        ui.add_space(4.0);

                        let right_arrow = ui.add(egui::Label::new(
                            RichText::new(egui_phosphor::regular::CARET_RIGHT)
                                .size(14.0)
                                .color(button_text),
                        ).sense(egui::Sense::click()));
                        if right_arrow.hovered() {
                            ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                        }
                        if right_arrow.clicked() {
                            self.navigate(1);
                        }
                    });
                });

            if ui
                .add(egui::Button::new(RichText::new("Today").size(13.0)).min_size(egui::vec2(0.0, 24.0)))
                .clicked()
            {
                self.jump_to_today();
            }

            ui.add_space(16.0);

            // View switcher
            let view_modes = [
                (ViewMode::Month, egui_phosphor::regular::CALENDAR_BLANK, "Month"),
                (ViewMode::Day, egui_phosphor::regular::CLOCK, "Day"),
                (ViewMode::Timeline, egui_phosphor::regular::CHART_BAR, "Timeline"),
            ];
            for (mode, icon, label) in view_modes {
                let selected = self.config.view_mode == mode;
                let text = format!("{} {}", icon, label);
                let color = if selected {
                    Color32::WHITE
                } else {
                    theme::TEXT_SECONDARY
                };
                let response = ui.add(egui::Label::new(
                    RichText::new(text).size(14.0).color(color),
                ).sense(egui::Sense::click()));
                if response.hovered() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                }
                if response.clicked() && !selected {
                    self.config.view_mode = mode;
                    let _ = self.config.save();
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let text_color = theme::TEXT_SECONDARY;
                let hover_color = Color32::WHITE;
                let font_id = egui::FontId::proportional(18.0);

                // Reload button
                let reload_icon = egui_phosphor::regular::ARROWS_CLOCKWISE;
                let icon_size = ui.fonts(|f| {
                    f.layout_no_wrap(reload_icon.to_string(), font_id.clone(), Color32::WHITE)
                        .size()
                });
                let (reload_rect, reload_response) =
                    ui.allocate_exact_size(icon_size + egui::vec2(8.0, 4.0), egui::Sense::click());
                let reload_col = if reload_response.hovered() { hover_color } else { text_color };
                ui.painter().text(
                    reload_rect.center(),
                    egui::Align2::CENTER_CENTER,
                    reload_icon,
                    font_id.clone(),
                    reload_col,
                );
                if reload_response.on_hover_text("Reload documents").clicked() {
                    self.refresh_snapshot();
                }

                ui.add_space(12.0);

                // Export button (JSON icon)
                let export_icon = egui_phosphor::regular::BRACKETS_CURLY;
                let icon_size = ui.fonts(|f| {
                    f.layout_no_wrap(export_icon.to_string(), font_id.clone(), Color32::WHITE)
                        .size()
                });
                let (export_rect, export_response) =
                    ui.allocate_exact_size(icon_size + egui::vec2(8.0, 4.0), egui::Sense::click());
                let export_col = if export_response.hovered() { hover_color } else { text_color };
                ui.painter().text(
                    export_rect.center(),
                    egui::Align2::CENTER_CENTER,
                    export_icon,
                    font_id,
                    export_col,
                );
                if export_response.on_hover_text("Export week to JSON").clicked() {
                    self.export_focus_week();
                }

                ui.add_space(12.0);

                if let Some((message, is_error)) = &self.status_message {
                    let color = if *is_error {
                        theme::ALERT
                    } else {
                        theme::TEXT_SECONDARY
                    };
                    ui.label(RichText::new(message).size(12.0).color(color));
                }
            });
        });
    }

    fn render_month(&mut self, ui: &mut egui::Ui) {
        let today = Local::now().date_naive();
        let cells = build_month(
            self.month_anchor,
            today,
            &self.snapshot.tasks,
            &self.snapshot.habits,
            self.config.working_hours(),
        );
        let result = views::render_month_view(ui, &cells);
        if let Some(day) = result.focus_day {
            self.focus_day = day;
            self.config.view_mode = ViewMode::Day;
            let _ = self.config.save();
        }
    }

    fn render_day(&mut self, ui: &mut egui::Ui) {
        let geometry = self.config.grid_geometry();
        let grid = build_day_grid(
            self.focus_day,
            &self.snapshot.tasks,
            &self.snapshot.habits,
            self.config.working_hours(),
            geometry,
        );

        let result = views::render_day_view(
            ui,
            &grid,
            geometry,
            self.config.clock_format,
            &self.coordinator,
        );

        if let Some(item) = result.grab {
            self.coordinator.grab(item.id, item.duration_minutes);
        }
        if result.cancelled {
            self.coordinator.cancel();
        } else {
            if let Some(slot) = result.hover_slot {
                self.coordinator.hover(slot);
            } else if result.left_slots {
                self.coordinator.leave_slots();
            }
            if result.dropped {
                if let Some(commit) = self.coordinator.drop_on(self.focus_day) {
                    self.commit_reschedule(commit);
                }
            }
        }
        if let Some(slot) = result.create_at {
            self.new_block_slot = slot;
            self.new_block_title = String::new();
            self.show_new_block = true;
        }
        if let Some(item) = result.toggle_done {
            self.toggle_done(item);
        }
    }

    fn render_timeline(&mut self, ui: &mut egui::Ui) {
        let today = Local::now().date_naive();
        let groups = build_project_groups(&self.snapshot, &self.window);
        self.expand.auto_expand_first_incomplete(&groups);

        let result = views::render_timeline_view(ui, &groups, &self.window, &self.expand, today);
        if let Some(id) = result.toggle_project {
            self.expand.toggle_project(id);
        }
        if let Some(id) = result.toggle_milestone {
            self.expand.toggle_milestone(id);
        }
    }

    fn render_new_block_dialog(&mut self, ctx: &egui::Context) {
        let (content_bg, frame_color, _frame_text) = theme::dialog_colors();
        let slot = self.new_block_slot;
        let mut create_clicked = false;
        let mut cancel_clicked = false;

        egui::Window::new("New block")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .frame(
                egui::Frame::window(&ctx.style())
                    .fill(content_bg)
                    .stroke(egui::Stroke::new(1.0, frame_color)),
            )
            .show(ctx, |ui| {
                ui.label(format!(
                    "{} at {}",
                    self.focus_day.format("%a, %b %-d"),
                    views::format_clock_time(slot.hour as u32, slot.minute as u32, self.config.clock_format),
                ));
                ui.add_space(8.0);
                let response = ui.add(
                    egui::TextEdit::singleline(&mut self.new_block_title)
                        .hint_text("What are you planning?")
                        .desired_width(280.0),
                );
                response.request_focus();
                let enter = response.lost_focus()
                    && ui.input(|i| i.key_pressed(egui::Key::Enter));
                ui.add_space(12.0);
                ui.horizontal(|ui| {
                    if ui.button("Create").clicked() || enter {
                        create_clicked = true;
                    }
                    if ui.button("Cancel").clicked()
                        || ui.input(|i| i.key_pressed(egui::Key::Escape))
                    {
                        cancel_clicked = true;
                    }
                });
            });

        if create_clicked {
            self.create_block();
            self.show_new_block = false;
        }
        if cancel_clicked {
            self.show_new_block = false;
        }
    }
}

impl eframe::App for TempoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_async_results();

        egui::CentralPanel::default().show(ctx, |ui| {
            self.render_header(ui);
            ui.add_space(8.0);

            match self.config.view_mode {
                ViewMode::Month => self.render_month(ui),
                ViewMode::Day => self.render_day(ui),
                ViewMode::Timeline => self.render_timeline(ui),
            }
        });

        if self.show_new_block {
            self.render_new_block_dialog(ctx);
        }

        // A pending store round-trip resolves without further input; keep
        // the frame loop ticking until its result lands.
        if self.loading {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}
