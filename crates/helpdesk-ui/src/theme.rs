//! UI theme constants

use egui::{Color32, CornerRadius, Stroke, Vec2};
use helpdesk_types::event::NotificationLevel;

pub const BG_PRIMARY: Color32 = Color32::from_rgb(22, 24, 29);
pub const BG_SECONDARY: Color32 = Color32::from_rgb(34, 37, 44);
pub const BG_SURFACE: Color32 = Color32::from_rgb(48, 52, 61);
pub const BG_HUMAN: Color32 = Color32::from_rgb(37, 48, 78);
pub const TEXT_PRIMARY: Color32 = Color32::from_rgb(229, 231, 235);
pub const TEXT_SECONDARY: Color32 = Color32::from_rgb(156, 163, 175);
pub const ACCENT: Color32 = Color32::from_rgb(59, 130, 246);
pub const SUCCESS: Color32 = Color32::from_rgb(34, 197, 94);
pub const ERROR: Color32 = Color32::from_rgb(239, 68, 68);
pub const WARNING: Color32 = Color32::from_rgb(234, 179, 8);

pub const PANEL_ROUNDING: CornerRadius = CornerRadius::same(6);
pub const PANEL_PADDING: Vec2 = Vec2::new(12.0, 8.0);
pub const CARD_WIDTH: f32 = 720.0;

pub fn notification_color(level: NotificationLevel) -> Color32 {
    match level {
        NotificationLevel::Info => ACCENT,
        NotificationLevel::Success => SUCCESS,
        NotificationLevel::Error => ERROR,
    }
}

/// Badge colour for a ticket's open/closed state
pub fn status_color(closed: bool) -> Color32 {
    if closed {
        TEXT_SECONDARY
    } else {
        SUCCESS
    }
}

/// Apply the dark theme to an egui context
pub fn apply_theme(ctx: &egui::Context) {
    let mut style = (*ctx.style()).clone();

    style.visuals.dark_mode = true;
    style.visuals.panel_fill = BG_PRIMARY;
    style.visuals.window_fill = BG_SECONDARY;
    style.visuals.extreme_bg_color = BG_SECONDARY;

    style.visuals.widgets.inactive.bg_fill = BG_SURFACE;
    style.visuals.widgets.inactive.weak_bg_fill = BG_SURFACE;
    style.visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, TEXT_SECONDARY);
    style.visuals.widgets.hovered.bg_fill = BG_SURFACE;
    style.visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);
    style.visuals.widgets.active.bg_fill = ACCENT;
    style.visuals.widgets.active.fg_stroke = Stroke::new(1.0, TEXT_PRIMARY);

    style.visuals.selection.bg_fill = ACCENT.linear_multiply(0.4);
    style.visuals.selection.stroke = Stroke::new(1.0, ACCENT);

    style.spacing.item_spacing = Vec2::new(8.0, 6.0);
    style.spacing.button_padding = Vec2::new(10.0, 4.0);

    ctx.set_style(style);
}
