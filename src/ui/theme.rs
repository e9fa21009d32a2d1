use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

use crate::schedule::{ItemKind, Priority};

/// Shared accent for selection, today markers and the active view tab.
pub const ACCENT: Color32 = Color32::from_rgb(0x13, 0x98, 0xf4);
/// Overdue / overbooked red, also the error color in the status line.
pub const ALERT: Color32 = Color32::from_rgb(0xe5, 0x4d, 0x42);
/// Near-capacity amber.
pub const WARN: Color32 = Color32::from_rgb(0xe5, 0xaa, 0x00);
/// Completed / ok green.
pub const OK: Color32 = Color32::from_rgb(0x65, 0xba, 0x43);

// Warm grays (R=G > B) over a pure black background.
pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(0xc8, 0xc8, 0xc0);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(0x90, 0x90, 0x88);
pub const TEXT_DIM: Color32 = Color32::from_rgb(0x70, 0x70, 0x68);
pub const BORDER: Color32 = Color32::from_rgb(0x28, 0x28, 0x26);
const SURFACE: Color32 = Color32::from_rgb(0x28, 0x28, 0x26);
const SURFACE_RAISED: Color32 = Color32::from_rgb(0x38, 0x38, 0x34);
const SURFACE_HOVER: Color32 = Color32::from_rgb(0x50, 0x50, 0x4a);

/// Font family for filled Phosphor icons
pub fn phosphor_fill_family() -> FontFamily {
    FontFamily::Name("phosphor-fill".into())
}

pub fn setup_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    // Add Phosphor Regular icons as fallback in Proportional family
    egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);

    // Add Phosphor Fill as a separate font family for filled icons
    fonts.font_data.insert(
        "phosphor-fill".into(),
        egui_phosphor::Variant::Fill.font_data(),
    );
    fonts.families.insert(
        FontFamily::Name("phosphor-fill".into()),
        vec!["phosphor-fill".into()],
    );

    ctx.set_fonts(fonts);
}

pub fn setup_theme(ctx: &egui::Context) {
    let mut visuals = Visuals::dark();

    visuals.panel_fill = Color32::BLACK;
    visuals.window_fill = Color32::BLACK;
    visuals.extreme_bg_color = Color32::BLACK;
    visuals.faint_bg_color = Color32::from_rgb(0x14, 0x14, 0x12);

    visuals.widgets.noninteractive.bg_fill = SURFACE;
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, Color32::from_rgb(0xb0, 0xb0, 0xa8));
    visuals.widgets.inactive.bg_fill = SURFACE_RAISED;
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    visuals.widgets.hovered.bg_fill = SURFACE_HOVER;
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.widgets.active.bg_fill = ACCENT;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    visuals.selection.bg_fill = ACCENT;
    visuals.selection.stroke = Stroke::new(1.0, Color32::WHITE);
    visuals.hyperlink_color = ACCENT;

    for widget in [
        &mut visuals.widgets.noninteractive,
        &mut visuals.widgets.inactive,
        &mut visuals.widgets.hovered,
        &mut visuals.widgets.active,
    ] {
        widget.rounding = Rounding::same(6.0);
    }
    visuals.window_rounding = Rounding::same(8.0);

    let mut style = Style::default();
    style.visuals = visuals;

    // One body size everywhere; the views size their own labels.
    style.text_styles = [
        (TextStyle::Small, FontId::proportional(14.0)),
        (TextStyle::Body, FontId::proportional(14.0)),
        (TextStyle::Button, FontId::proportional(14.0)),
        (TextStyle::Heading, FontId::proportional(14.0)),
        (TextStyle::Monospace, FontId::monospace(14.0)),
    ]
    .into();

    style.spacing.item_spacing = egui::vec2(12.0, 10.0);
    style.spacing.button_padding = egui::vec2(18.0, 10.0);
    style.spacing.window_margin = egui::Margin::same(24.0);

    ctx.set_style(style);
}

/// Returns (bg_color, text_color) for button-like elements
pub fn button_colors() -> (Color32, Color32) {
    (SURFACE_RAISED, TEXT_PRIMARY)
}

/// Returns (content_bg, frame_color, frame_text) for dialogs
pub fn dialog_colors() -> (Color32, Color32, Color32) {
    (
        Color32::BLACK,
        Color32::from_rgb(0x28, 0x28, 0x26),
        Color32::from_rgb(0xb0, 0xb0, 0xa8),
    )
}

/// Returns (cell_bg, border, dimmed_bg) for calendar cells
pub fn calendar_colors() -> (Color32, Color32, Color32) {
    (
        Color32::from_rgb(0x14, 0x14, 0x12),   // cell bg
        BORDER,
        Color32::from_rgb(0x0a, 0x0a, 0x09),   // out-of-month / weekend bg
    )
}

/// Capacity meter color: calm below 80%, amber up to 100%, red past it.
/// The percent itself stays uncapped; only the meter width is clamped by
/// the caller.
pub fn capacity_color(percent: u32) -> Color32 {
    if percent > 100 {
        ALERT
    } else if percent > 80 {
        WARN
    } else {
        OK
    }
}

/// Accent color for a task's priority level.
pub fn priority_color(priority: Priority) -> Color32 {
    match priority {
        Priority::Low => TEXT_SECONDARY,
        Priority::Medium => ACCENT,
        Priority::High => Color32::from_rgb(0xec, 0x71, 0x1b),
        Priority::Urgent => ALERT,
    }
}

/// Accent color for a placed block: habits keep one color, tasks follow
/// their priority.
pub fn block_accent(kind: ItemKind, priority: Priority) -> Color32 {
    match kind {
        ItemKind::Habit => Color32::from_rgb(0x90, 0x4e, 0xe2),
        ItemKind::Task => priority_color(priority),
    }
}

/// Returns (block_bg, block_border) for placed blocks
pub fn block_colors() -> (Color32, Color32) {
    (Color32::from_rgb(0x1c, 0x1c, 0x1a), BORDER)
}

/// Bar color for a project's timeline rows, cycling a fixed palette.
pub fn project_color(color_index: usize) -> Color32 {
    const PALETTE: [Color32; 6] = [
        ACCENT,
        OK,
        Color32::from_rgb(0x90, 0x4e, 0xe2),   // purple
        Color32::from_rgb(0xec, 0x71, 0x1b),   // orange
        Color32::from_rgb(0xe8, 0x28, 0x71),   // magenta
        WARN,
    ];
    PALETTE[color_index % PALETTE.len()]
}
