use chrono::NaiveDate;
use egui::{Color32, RichText, Ui};
use uuid::Uuid;

use super::theme::{
    block_accent, block_colors, calendar_colors, capacity_color, phosphor_fill_family,
    priority_color, project_color, ACCENT, ALERT, BORDER, OK, TEXT_DIM, TEXT_PRIMARY,
    TEXT_SECONDARY, WARN,
};
use crate::config::ClockFormat;
use crate::schedule::{
    BarKind, DayCell, DayGrid, DragItem, ExpandState, GridGeometry, PlacedBlock, ProjectGroup,
    RescheduleCoordinator, SchedulableItem, SlotRef, TaskRow, TimelineBar, TimelineWindow,
};

const WEEKDAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Format an hour:minute pair according to the clock format
pub fn format_clock_time(hour: u32, minute: u32, clock_format: ClockFormat) -> String {
    match clock_format {
        ClockFormat::Hour24 => format!("{:02}:{:02}", hour, minute),
        ClockFormat::Hour12 => {
            let (h12, ampm) = if hour == 0 {
                (12, "am")
            } else if hour < 12 {
                (hour, "am")
            } else if hour == 12 {
                (12, "pm")
            } else {
                (hour - 12, "pm")
            };
            format!("{}:{:02}{}", h12, minute, ampm)
        }
    }
}

// ============================================================================
// Month view
// ============================================================================

/// Result from month view interactions
#[derive(Default)]
pub struct MonthResult {
    /// Cell clicked - switch to the day view on this date
    pub focus_day: Option<NaiveDate>,
}

/// Render the month calendar grid (always whole weeks, Sun-Sat)
pub fn render_month_view(ui: &mut Ui, cells: &[DayCell]) -> MonthResult {
    let mut result = MonthResult::default();
    let (cell_bg, border, dimmed_bg) = calendar_colors();

    let available_width = ui.available_width();
    let cell_width = available_width / 7.0;
    let header_height = 24.0;

    // Weekday header row
    let (header_rect, _) = ui.allocate_exact_size(
        egui::vec2(available_width, header_height),
        egui::Sense::hover(),
    );
    let painter = ui.painter();
    for (i, label) in WEEKDAY_LABELS.iter().enumerate() {
        painter.text(
            egui::pos2(
                header_rect.min.x + (i as f32 + 0.5) * cell_width,
                header_rect.center().y,
            ),
            egui::Align2::CENTER_CENTER,
            label,
            egui::FontId::proportional(12.0),
            TEXT_SECONDARY,
        );
    }

    let rows = cells.len() / 7;
    let cell_height = ((ui.available_height() - 4.0) / rows.max(1) as f32).clamp(80.0, 140.0);

    egui::ScrollArea::vertical().show(ui, |ui| {
        ui.spacing_mut().item_spacing = egui::vec2(0.0, 0.0);

        for row in 0..rows {
            let (row_rect, _) = ui.allocate_exact_size(
                egui::vec2(available_width, cell_height),
                egui::Sense::hover(),
            );

            for col in 0..7 {
                let cell = &cells[row * 7 + col];
                let rect = egui::Rect::from_min_size(
                    egui::pos2(row_rect.min.x + col as f32 * cell_width, row_rect.min.y),
                    egui::vec2(cell_width, cell_height),
                );

                let response = ui.interact(
                    rect.shrink(1.0),
                    ui.make_persistent_id(("month_cell", cell.date)),
                    egui::Sense::click(),
                );
                if response.clicked() {
                    result.focus_day = Some(cell.date);
                }
                if response.hovered() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
                }

                let painter = ui.painter();
                let bg = if cell.in_anchor_month && !cell.is_weekend {
                    cell_bg
                } else {
                    dimmed_bg
                };
                painter.rect(rect.shrink(1.0), 4.0, bg, egui::Stroke::new(1.0, border));

                // Day number, circled on today
                let number_pos = egui::pos2(rect.min.x + 14.0, rect.min.y + 12.0);
                if cell.is_today {
                    painter.circle_filled(number_pos, 10.0, ACCENT);
                }
                let number_color = if cell.is_today {
                    Color32::WHITE
                } else if cell.in_anchor_month {
                    TEXT_PRIMARY
                } else {
                    TEXT_DIM
                };
                painter.text(
                    number_pos,
                    egui::Align2::CENTER_CENTER,
                    cell.date.format("%-d").to_string(),
                    egui::FontId::proportional(13.0),
                    number_color,
                );

                // Attention flag, top right
                if !cell.needs_attention.is_empty() {
                    painter.text(
                        egui::pos2(rect.max.x - 12.0, rect.min.y + 12.0),
                        egui::Align2::CENTER_CENTER,
                        format!(
                            "{} {}",
                            egui_phosphor::fill::WARNING,
                            cell.needs_attention.len()
                        ),
                        egui::FontId::new(11.0, phosphor_fill_family()),
                        ALERT,
                    );
                }

                // A line per scheduled item, most compact form that still
                // reads at a glance; the day view has the detail.
                let mut line_y = rect.min.y + 28.0;
                let max_line_y = rect.max.y - 22.0;
                for (shown, item) in cell.scheduled.iter().enumerate() {
                    if line_y > max_line_y {
                        painter.text(
                            egui::pos2(rect.min.x + 6.0, line_y),
                            egui::Align2::LEFT_TOP,
                            format!("+{} more", cell.scheduled.len() - shown),
                            egui::FontId::proportional(10.0),
                            TEXT_SECONDARY,
                        );
                        break;
                    }
                    let color = if item.completed {
                        TEXT_DIM
                    } else {
                        block_accent(item.kind, item.priority)
                    };
                    painter.circle_filled(egui::pos2(rect.min.x + 9.0, line_y + 6.0), 2.5, color);
                    let label = painter.layout_no_wrap(
                        item.title.clone(),
                        egui::FontId::proportional(11.0),
                        if item.completed {
                            TEXT_DIM
                        } else {
                            TEXT_PRIMARY
                        },
                    );
                    painter.galley(egui::pos2(rect.min.x + 16.0, line_y), label, Color32::WHITE);
                    line_y += 14.0;
                }

                // Due-but-unscheduled count under the scheduled lines
                if !cell.unscheduled_due.is_empty() && line_y <= max_line_y {
                    painter.text(
                        egui::pos2(rect.min.x + 6.0, line_y),
                        egui::Align2::LEFT_TOP,
                        format!("{} due unplanned", cell.unscheduled_due.len()),
                        egui::FontId::proportional(10.0),
                        WARN,
                    );
                }

                // Capacity meter along the bottom edge. Width clamps at
                // 100%, the label keeps the raw uncapped number.
                if cell.available_minutes > 0 && cell.scheduled_minutes > 0 {
                    let meter_rect = egui::Rect::from_min_size(
                        egui::pos2(rect.min.x + 6.0, rect.max.y - 14.0),
                        egui::vec2(cell_width - 48.0, 4.0),
                    );
                    painter.rect_filled(meter_rect, 2.0, BORDER);
                    let fill_fraction = (cell.capacity_percent as f32 / 100.0).min(1.0);
                    let fill_rect = egui::Rect::from_min_size(
                        meter_rect.min,
                        egui::vec2(meter_rect.width() * fill_fraction, meter_rect.height()),
                    );
                    painter.rect_filled(fill_rect, 2.0, capacity_color(cell.capacity_percent));
                    painter.text(
                        egui::pos2(rect.max.x - 8.0, rect.max.y - 12.0),
                        egui::Align2::RIGHT_CENTER,
                        format!("{}%", cell.capacity_percent),
                        egui::FontId::proportional(10.0),
                        capacity_color(cell.capacity_percent),
                    );
                }
            }
        }
    });

    result
}

// ============================================================================
// Day view
// ============================================================================

/// Result from day view interactions. The app feeds these into the
/// reschedule coordinator; the view itself holds no drag state.
#[derive(Default)]
pub struct DayResult {
    /// Drag started on a placed block or a sidebar item
    pub grab: Option<DragItem>,
    /// Slot currently under the pointer while dragging
    pub hover_slot: Option<SlotRef>,
    /// Pointer left the slot grid while dragging
    pub left_slots: bool,
    /// Primary button released this frame (complete the drag)
    pub dropped: bool,
    /// Esc or right-click (abandon the drag)
    pub cancelled: bool,
    /// Double-click on an empty slot - create a new block here
    pub create_at: Option<SlotRef>,
    /// Completion circle clicked on an item
    pub toggle_done: Option<SchedulableItem>,
}

const HOUR_LABEL_WIDTH: f32 = 60.0;
const SIDEBAR_WIDTH: f32 = 240.0;
const MIN_BLOCK_HEIGHT: f32 = 18.0;

/// Render the day time-block grid plus the unscheduled sidebar
pub fn render_day_view(
    ui: &mut Ui,
    grid: &DayGrid,
    geometry: GridGeometry,
    clock_format: ClockFormat,
    coordinator: &RescheduleCoordinator,
) -> DayResult {
    let mut result = DayResult::default();

    // Global drag signals, read once per frame
    if coordinator.is_dragging() {
        let (released, esc, right_click) = ui.ctx().input(|i| {
            (
                i.pointer.button_released(egui::PointerButton::Primary),
                i.key_pressed(egui::Key::Escape),
                i.pointer.button_pressed(egui::PointerButton::Secondary),
            )
        });
        if esc || right_click {
            result.cancelled = true;
        } else if released {
            result.dropped = true;
        }
    }

    ui.horizontal_top(|ui| {
        let grid_width = ui.available_width() - SIDEBAR_WIDTH - 16.0;
        ui.vertical(|ui| {
            ui.set_width(grid_width);
            render_slot_grid(ui, grid, geometry, clock_format, coordinator, &mut result);
        });
        ui.add_space(8.0);
        ui.vertical(|ui| {
            ui.set_width(SIDEBAR_WIDTH);
            render_unscheduled_sidebar(ui, grid, &mut result);
        });
    });

    result
}

fn render_slot_grid(
    ui: &mut Ui,
    grid: &DayGrid,
    geometry: GridGeometry,
    clock_format: ClockFormat,
    coordinator: &RescheduleCoordinator,
    result: &mut DayResult,
) {
    let grid_line_color = BORDER;
    let hour_line_color = Color32::from_rgb(0x40, 0x40, 0x3c);
    let (block_bg, block_border) = block_colors();

    // Utilization summary above the grid; the percent is never clamped.
    ui.horizontal(|ui| {
        let utilization = grid.utilization;
        let summary = format!(
            "{}m scheduled / {}m available",
            utilization.scheduled_minutes, utilization.working_minutes
        );
        ui.label(RichText::new(summary).size(12.0).color(TEXT_SECONDARY));
        ui.label(
            RichText::new(format!("{}%", utilization.percent))
                .size(12.0)
                .strong()
                .color(capacity_color(utilization.percent)),
        );
        if utilization.is_overbooked {
            ui.label(
                RichText::new("overbooked")
                    .size(12.0)
                    .color(ALERT),
            );
        }
    });
    ui.add_space(4.0);

    let available_width = ui.available_width();
    let total_height = geometry.total_height_px();

    egui::ScrollArea::vertical().show(ui, |ui| {
        let (grid_rect, _) = ui.allocate_exact_size(
            egui::vec2(available_width, total_height),
            egui::Sense::hover(),
        );
        let slots_rect = egui::Rect::from_min_max(
            egui::pos2(grid_rect.min.x + HOUR_LABEL_WIDTH, grid_rect.min.y),
            grid_rect.max,
        );

        let painter = ui.painter();

        // Slot rows: label full hours, shade out-of-working-hours slots
        for (idx, slot) in grid.slots.iter().enumerate() {
            let y = grid_rect.min.y + idx as f32 * geometry.slot_height_px;
            let slot_rect = egui::Rect::from_min_size(
                egui::pos2(slots_rect.min.x, y),
                egui::vec2(slots_rect.width(), geometry.slot_height_px),
            );

            if !slot.in_working_hours {
                painter.rect_filled(slot_rect, 0.0, Color32::from_rgb(0x0a, 0x0a, 0x09));
            }

            let is_hour = slot.minute == 0;
            if is_hour {
                painter.text(
                    egui::pos2(grid_rect.min.x + HOUR_LABEL_WIDTH - 8.0, y),
                    egui::Align2::RIGHT_TOP,
                    format_clock_time(slot.hour as u32, 0, clock_format),
                    egui::FontId::proportional(11.0),
                    TEXT_DIM,
                );
            }
            painter.line_segment(
                [
                    egui::pos2(slots_rect.min.x, y),
                    egui::pos2(slots_rect.max.x, y),
                ],
                egui::Stroke::new(1.0, if is_hour { hour_line_color } else { grid_line_color }),
            );
        }

        // Placed blocks
        let mut block_rects: Vec<egui::Rect> = Vec::new();
        let dragged_id = coordinator.dragged_item().map(|i| i.id);
        for block in &grid.blocks {
            let rect = block_rect(block, &slots_rect);
            block_rects.push(rect);

            // The dragged block only shows as the ghost preview
            if dragged_id == Some(block.item.id) {
                continue;
            }

            // Drag interaction first, so the completion circle painted by
            // paint_block registers on top of it and stays clickable.
            let response = ui.interact(
                rect,
                ui.make_persistent_id(("day_block", block.item.id)),
                egui::Sense::click_and_drag(),
            );
            if response.drag_started() {
                result.grab = Some(DragItem {
                    id: block.item.id,
                    duration_minutes: block.item.duration_minutes,
                });
            }
            if response.hovered() && !coordinator.is_dragging() {
                ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
            }

            paint_block(ui, rect, &block.item, block_bg, block_border, clock_format, result);
        }

        // Hover tracking + ghost preview while a drag is in flight
        if coordinator.is_dragging() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
            let pointer = ui.ctx().pointer_hover_pos().or(ui.ctx().input(|i| i.pointer.latest_pos()));
            match pointer.filter(|p| slots_rect.contains(*p)) {
                Some(pos) => {
                    let idx = ((pos.y - slots_rect.min.y) / geometry.slot_height_px)
                        .floor()
                        .clamp(0.0, (grid.slots.len().saturating_sub(1)) as f32)
                        as usize;
                    if let Some(slot) = grid.slots.get(idx) {
                        result.hover_slot = Some(SlotRef {
                            hour: slot.hour,
                            minute: slot.minute,
                        });
                        if let Some(item) = coordinator.dragged_item() {
                            let ghost_y = slots_rect.min.y + idx as f32 * geometry.slot_height_px;
                            let ghost_height = (item.duration_minutes as f32
                                / geometry.slot_minutes.max(1) as f32
                                * geometry.slot_height_px
                                - geometry.block_gap_px)
                                .max(MIN_BLOCK_HEIGHT);
                            let ghost_rect = egui::Rect::from_min_size(
                                egui::pos2(slots_rect.min.x + 2.0, ghost_y),
                                egui::vec2(slots_rect.width() - 4.0, ghost_height),
                            );
                            let accent = Color32::from_rgb(0x61, 0xAF, 0xEF);
                            ui.painter().rect(
                                ghost_rect,
                                4.0,
                                Color32::from_rgba_unmultiplied(0x61, 0xAF, 0xEF, 40),
                                egui::Stroke::new(1.0, accent),
                            );
                            ui.painter().text(
                                ghost_rect.left_center() + egui::vec2(8.0, 0.0),
                                egui::Align2::LEFT_CENTER,
                                format_clock_time(slot.hour as u32, slot.minute as u32, clock_format),
                                egui::FontId::proportional(12.0),
                                accent,
                            );
                        }
                    }
                }
                None => {
                    result.left_slots = true;
                }
            }
        }

        // Double-click on empty grid space creates a block at that slot
        let grid_response = ui.interact(
            slots_rect,
            ui.make_persistent_id("day_grid_bg"),
            egui::Sense::click(),
        );
        if grid_response.double_clicked() && !coordinator.is_dragging() {
            if let Some(pos) = grid_response.interact_pointer_pos() {
                let over_block = block_rects.iter().any(|r| r.contains(pos));
                if !over_block {
                    let idx = ((pos.y - slots_rect.min.y) / geometry.slot_height_px)
                        .floor()
                        .clamp(0.0, (grid.slots.len().saturating_sub(1)) as f32)
                        as usize;
                    if let Some(slot) = grid.slots.get(idx) {
                        result.create_at = Some(SlotRef {
                            hour: slot.hour,
                            minute: slot.minute,
                        });
                    }
                }
            }
        }
    });
}

fn block_rect(block: &PlacedBlock, slots_rect: &egui::Rect) -> egui::Rect {
    egui::Rect::from_min_size(
        egui::pos2(slots_rect.min.x + 2.0, slots_rect.min.y + block.top_offset_px),
        egui::vec2(
            slots_rect.width() - 4.0,
            block.height_px.max(MIN_BLOCK_HEIGHT),
        ),
    )
}

fn paint_block(
    ui: &mut Ui,
    rect: egui::Rect,
    item: &SchedulableItem,
    block_bg: Color32,
    block_border: Color32,
    clock_format: ClockFormat,
    result: &mut DayResult,
) {
    let painter = ui.painter();
    let accent = block_accent(item.kind, item.priority);

    painter.rect(rect, 4.0, block_bg, egui::Stroke::new(1.0, block_border));

    // Left accent stripe
    let accent_rect = egui::Rect::from_min_size(rect.min, egui::vec2(3.0, rect.height()));
    painter.rect(
        accent_rect,
        egui::Rounding {
            nw: 4.0,
            sw: 4.0,
            ne: 0.0,
            se: 0.0,
        },
        accent,
        egui::Stroke::NONE,
    );

    // Completion circle, clickable
    let circle_center = egui::pos2(rect.min.x + 16.0, rect.center().y.min(rect.min.y + 12.0));
    let circle_rect = egui::Rect::from_center_size(circle_center, egui::vec2(16.0, 16.0));
    let circle_response = ui.interact(
        circle_rect,
        ui.make_persistent_id(("block_done", item.id)),
        egui::Sense::click(),
    );
    if circle_response.clicked() {
        result.toggle_done = Some(item.clone());
    }
    if item.completed {
        painter.text(
            circle_center,
            egui::Align2::CENTER_CENTER,
            egui_phosphor::fill::CHECK_CIRCLE,
            egui::FontId::new(13.0, phosphor_fill_family()),
            OK,
        );
    } else {
        painter.circle_stroke(
            circle_center,
            6.0,
            egui::Stroke::new(1.5, TEXT_SECONDARY),
        );
    }

    // Title + start time on one line
    let text_color = if item.completed {
        TEXT_DIM
    } else {
        Color32::WHITE
    };
    let mut x = rect.min.x + 28.0;
    let line_y = rect.min.y + 12.0_f32.min(rect.height() / 2.0);
    if let Some(start) = item.scheduled_start {
        let time_galley = ui.painter().layout_no_wrap(
            format_clock_time(start.hour(), start.minute(), clock_format),
            egui::FontId::proportional(12.0),
            TEXT_SECONDARY,
        );
        ui.painter().galley(
            egui::pos2(x, line_y - time_galley.size().y / 2.0),
            time_galley.clone(),
            Color32::WHITE,
        );
        x += time_galley.size().x + 8.0;
    }
    let title_galley = ui.painter().layout_no_wrap(
        item.title.clone(),
        egui::FontId::proportional(13.0),
        text_color,
    );
    if x + title_galley.size().x < rect.max.x - 4.0 {
        ui.painter()
            .galley(egui::pos2(x, line_y - title_galley.size().y / 2.0), title_galley, Color32::WHITE);
    }
}

fn render_unscheduled_sidebar(ui: &mut Ui, grid: &DayGrid, result: &mut DayResult) {
    ui.label(
        RichText::new("Unscheduled")
            .size(12.0)
            .color(TEXT_SECONDARY),
    );
    ui.add_space(4.0);

    if grid.unscheduled.is_empty() {
        ui.label(
            RichText::new("Nothing waiting")
                .size(12.0)
                .color(TEXT_DIM),
        );
        return;
    }

    egui::ScrollArea::vertical()
        .id_salt("unscheduled_sidebar")
        .show(ui, |ui| {
            ui.spacing_mut().item_spacing.y = 4.0;
            for item in &grid.unscheduled {
                let (rect, response) = ui.allocate_exact_size(
                    egui::vec2(ui.available_width(), 36.0),
                    egui::Sense::click_and_drag(),
                );
                let (block_bg, block_border) = block_colors();
                let painter = ui.painter();
                painter.rect(rect, 4.0, block_bg, egui::Stroke::new(1.0, block_border));
                painter.circle_filled(
                    egui::pos2(rect.min.x + 12.0, rect.center().y),
                    3.0,
                    priority_color(item.priority),
                );
                painter.text(
                    egui::pos2(rect.min.x + 22.0, rect.center().y),
                    egui::Align2::LEFT_CENTER,
                    &item.title,
                    egui::FontId::proportional(13.0),
                    TEXT_PRIMARY,
                );
                painter.text(
                    egui::pos2(rect.max.x - 8.0, rect.center().y),
                    egui::Align2::RIGHT_CENTER,
                    format!("{}m", item.duration_minutes),
                    egui::FontId::proportional(11.0),
                    TEXT_DIM,
                );

                if response.drag_started() {
                    result.grab = Some(DragItem {
                        id: item.id,
                        duration_minutes: item.duration_minutes,
                    });
                }
                if response.hovered() {
                    ui.ctx().set_cursor_icon(egui::CursorIcon::Grab);
                }
            }
        });
}

// ============================================================================
// Timeline view
// ============================================================================

/// Result from timeline view interactions
#[derive(Default)]
pub struct TimelineResult {
    pub toggle_project: Option<Uuid>,
    pub toggle_milestone: Option<Uuid>,
}

const LABEL_GUTTER: f32 = 200.0;
const TIMELINE_ROW_HEIGHT: f32 = 26.0;
const TIMELINE_HEADER_HEIGHT: f32 = 28.0;

/// Render the project timeline: day-column header, expandable project and
/// milestone rows, bars clipped to the visible window
pub fn render_timeline_view(
    ui: &mut Ui,
    groups: &[ProjectGroup],
    window: &TimelineWindow,
    expand: &ExpandState,
    today: NaiveDate,
) -> TimelineResult {
    let mut result = TimelineResult::default();
    let available_width = ui.available_width();
    let chart_width = available_width - LABEL_GUTTER;
    let column_width = chart_width / window.days.max(1) as f32;
    let grid_line_color = BORDER;

    // Header: one label per day, thinned out when columns get narrow
    let (header_rect, _) = ui.allocate_exact_size(
        egui::vec2(available_width, TIMELINE_HEADER_HEIGHT),
        egui::Sense::hover(),
    );
    let painter = ui.painter();
    let label_every = if column_width >= 26.0 {
        1
    } else if column_width >= 13.0 {
        2
    } else {
        7
    };
    for (idx, date) in window.columns().enumerate() {
        if idx % label_every != 0 {
            continue;
        }
        let x = header_rect.min.x + LABEL_GUTTER + (idx as f32 + 0.5) * column_width;
        let is_today = date == today;
        painter.text(
            egui::pos2(x, header_rect.min.y + 8.0),
            egui::Align2::CENTER_CENTER,
            date.format("%-d").to_string(),
            egui::FontId::proportional(11.0),
            if is_today {
                ACCENT
            } else {
                TEXT_SECONDARY
            },
        );
        // Month tag under the first of each month and the window start
        if idx == 0 || date.format("%-d").to_string() == "1" {
            painter.text(
                egui::pos2(x, header_rect.min.y + 21.0),
                egui::Align2::CENTER_CENTER,
                date.format("%b").to_string(),
                egui::FontId::proportional(10.0),
                TEXT_DIM,
            );
        }
    }

    egui::ScrollArea::vertical().show(ui, |ui| {
        // Count visible rows first so the canvas can be allocated in one go
        let mut row_count = 0usize;
        for group in groups {
            row_count += 1;
            if expand.project_expanded(group.project.id) {
                for milestone_group in &group.milestones {
                    row_count += 1;
                    if expand.milestone_expanded(milestone_group.milestone.id) {
                        row_count += milestone_group.tasks.len();
                    }
                }
                row_count += group.unassigned.len();
            }
        }

        let canvas_height = (row_count as f32 * TIMELINE_ROW_HEIGHT).max(TIMELINE_ROW_HEIGHT);
        let (canvas_rect, _) = ui.allocate_exact_size(
            egui::vec2(available_width, canvas_height),
            egui::Sense::hover(),
        );
        let chart_rect = egui::Rect::from_min_max(
            egui::pos2(canvas_rect.min.x + LABEL_GUTTER, canvas_rect.min.y),
            canvas_rect.max,
        );

        let painter = ui.painter();

        // Day grid lines
        for idx in 0..=window.days {
            if idx % label_every != 0 {
                continue;
            }
            let x = chart_rect.min.x + idx as f32 * column_width;
            painter.line_segment(
                [
                    egui::pos2(x, canvas_rect.min.y),
                    egui::pos2(x, canvas_rect.max.y),
                ],
                egui::Stroke::new(1.0, grid_line_color),
            );
        }

        // Today line across the whole chart
        let today_offset = (today - window.start).num_days();
        if today_offset >= 0 && (today_offset as usize) < window.days {
            let x = chart_rect.min.x + (today_offset as f32 + 0.5) * column_width;
            painter.line_segment(
                [
                    egui::pos2(x, canvas_rect.min.y),
                    egui::pos2(x, canvas_rect.max.y),
                ],
                egui::Stroke::new(1.0, ALERT),
            );
        }

        let mut row = 0usize;
        for group in groups {
            let project_expanded = expand.project_expanded(group.project.id);
            let color = project_color(group.project.color_index);

            if draw_timeline_row(
                ui,
                &canvas_rect,
                &chart_rect,
                row,
                0,
                &group.project.name,
                Some(project_expanded),
                group.bar.as_ref(),
                color,
                window,
            ) {
                result.toggle_project = Some(group.project.id);
            }
            row += 1;

            if !project_expanded {
                continue;
            }

            for milestone_group in &group.milestones {
                let milestone_expanded = expand.milestone_expanded(milestone_group.milestone.id);
                if draw_timeline_row(
                    ui,
                    &canvas_rect,
                    &chart_rect,
                    row,
                    1,
                    &milestone_group.milestone.name,
                    Some(milestone_expanded),
                    milestone_group.bar.as_ref(),
                    color,
                    window,
                ) {
                    result.toggle_milestone = Some(milestone_group.milestone.id);
                }
                row += 1;

                if milestone_expanded {
                    for task_row in &milestone_group.tasks {
                        draw_task_timeline_row(ui, &canvas_rect, &chart_rect, row, 2, task_row, color, window);
                        row += 1;
                    }
                }
            }

            for task_row in &group.unassigned {
                draw_task_timeline_row(ui, &canvas_rect, &chart_rect, row, 1, task_row, color, window);
                row += 1;
            }
        }
    });

    result
}

/// Draw one labeled row with an optional caret and bar. Returns true when
/// the caret/label was clicked.
#[allow(clippy::too_many_arguments)]
fn draw_timeline_row(
    ui: &mut Ui,
    canvas_rect: &egui::Rect,
    chart_rect: &egui::Rect,
    row: usize,
    indent: usize,
    label: &str,
    expanded: Option<bool>,
    bar: Option<&TimelineBar>,
    color: Color32,
    window: &TimelineWindow,
) -> bool {
    let y = canvas_rect.min.y + row as f32 * TIMELINE_ROW_HEIGHT;
    let label_rect = egui::Rect::from_min_size(
        egui::pos2(canvas_rect.min.x, y),
        egui::vec2(LABEL_GUTTER, TIMELINE_ROW_HEIGHT),
    );

    let response = ui.interact(
        label_rect,
        ui.make_persistent_id(("timeline_row", row, label.to_owned())),
        egui::Sense::click(),
    );
    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }

    let painter = ui.painter();
    let indent_px = 10.0 + indent as f32 * 16.0;
    if let Some(expanded) = expanded {
        let caret = if expanded {
            egui_phosphor::regular::CARET_DOWN
        } else {
            egui_phosphor::regular::CARET_RIGHT
        };
        painter.text(
            egui::pos2(label_rect.min.x + indent_px, label_rect.center().y),
            egui::Align2::LEFT_CENTER,
            caret,
            egui::FontId::proportional(12.0),
            TEXT_SECONDARY,
        );
    }
    painter.text(
        egui::pos2(label_rect.min.x + indent_px + 16.0, label_rect.center().y),
        egui::Align2::LEFT_CENTER,
        label,
        egui::FontId::proportional(12.0),
        TEXT_PRIMARY,
    );

    if let Some(bar) = bar {
        draw_bar(painter, chart_rect, y, bar, color, window);
    }

    response.clicked()
}

#[allow(clippy::too_many_arguments)]
fn draw_task_timeline_row(
    ui: &mut Ui,
    canvas_rect: &egui::Rect,
    chart_rect: &egui::Rect,
    row: usize,
    indent: usize,
    task_row: &TaskRow,
    color: Color32,
    window: &TimelineWindow,
) {
    let y = canvas_rect.min.y + row as f32 * TIMELINE_ROW_HEIGHT;
    let painter = ui.painter();
    let indent_px = 10.0 + indent as f32 * 16.0 + 16.0;
    let text_color = if task_row.task.completed {
        TEXT_DIM
    } else {
        Color32::from_rgb(176, 176, 168)
    };
    painter.text(
        egui::pos2(canvas_rect.min.x + indent_px, y + TIMELINE_ROW_HEIGHT / 2.0),
        egui::Align2::LEFT_CENTER,
        &task_row.task.title,
        egui::FontId::proportional(12.0),
        text_color,
    );
    if let Some(bar) = &task_row.bar {
        draw_bar(painter, chart_rect, y, bar, color, window);
    }
}

/// Paint one bar from its column span. Milestones render as a diamond on
/// their single column; suppression happened upstream, so a bar here always
/// has a positive span.
fn draw_bar(
    painter: &egui::Painter,
    chart_rect: &egui::Rect,
    row_y: f32,
    bar: &TimelineBar,
    color: Color32,
    window: &TimelineWindow,
) {
    let total = window.days;
    let x = chart_rect.min.x + bar.span.left_percent(total) / 100.0 * chart_rect.width();
    let width = bar.span.width_percent(total) / 100.0 * chart_rect.width();
    let color = if bar.completed {
        Color32::from_rgb(0x50, 0x50, 0x4a)
    } else {
        color
    };

    match bar.kind {
        BarKind::Milestone => {
            let center = egui::pos2(x + width / 2.0, row_y + TIMELINE_ROW_HEIGHT / 2.0);
            let r = 6.0;
            painter.add(egui::Shape::convex_polygon(
                vec![
                    center + egui::vec2(0.0, -r),
                    center + egui::vec2(r, 0.0),
                    center + egui::vec2(0.0, r),
                    center + egui::vec2(-r, 0.0),
                ],
                color,
                egui::Stroke::NONE,
            ));
        }
        BarKind::Project => {
            let rect = egui::Rect::from_min_size(
                egui::pos2(x, row_y + 9.0),
                egui::vec2(width.max(2.0), 8.0),
            );
            painter.rect_filled(rect, 3.0, color);
        }
        BarKind::Task => {
            let rect = egui::Rect::from_min_size(
                egui::pos2(x, row_y + 6.0),
                egui::vec2(width.max(2.0), 14.0),
            );
            painter.rect(
                rect,
                3.0,
                color.linear_multiply(0.35),
                egui::Stroke::new(1.0, color),
            );
        }
    }
}
