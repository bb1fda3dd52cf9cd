//! Transient notifications, stacked in the bottom-right corner.

use egui::{self, Align2, RichText};
use crate::state::UiState;
use crate::theme::*;

pub fn toasts_overlay(ctx: &egui::Context, state: &mut UiState) {
    if state.toasts.is_empty() {
        return;
    }
    let mut dismissed = None;
    egui::Area::new(egui::Id::new("toasts"))
        .anchor(Align2::RIGHT_BOTTOM, egui::vec2(-16.0, -16.0))
        .show(ctx, |ui| {
            for toast in &state.toasts {
                egui::Frame::default()
                    .fill(BG_SECONDARY)
                    .stroke(egui::Stroke::new(1.0, notification_color(toast.level)))
                    .corner_radius(PANEL_ROUNDING)
                    .inner_margin(PANEL_PADDING)
                    .show(ui, |ui| {
                        ui.set_max_width(320.0);
                        ui.horizontal(|ui| {
                            ui.label(
                                RichText::new(&toast.title)
                                    .color(notification_color(toast.level))
                                    .strong(),
                            );
                            if ui.small_button("x").clicked() {
                                dismissed = Some(toast.id);
                            }
                        });
                        ui.label(RichText::new(&toast.description).color(TEXT_PRIMARY));
                    });
                ui.add_space(6.0);
            }
        });
    if let Some(id) = dismissed {
        state.dismiss_toast(id);
    }
}
