//! Sign-in view.

use egui::{self, RichText, Vec2};
use crate::theme::*;

/// Render the sign-in view. Returns true when the user asks to sign in.
pub fn login_panel(ui: &mut egui::Ui, signing_in: bool) -> bool {
    let mut clicked = false;
    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() * 0.25);
        ui.heading(RichText::new("Helpdesk").color(TEXT_PRIMARY).strong().size(28.0));
        ui.label(
            RichText::new("Describe your issue to the AI assistant or manage support tickets.")
                .color(TEXT_SECONDARY),
        );
        ui.add_space(24.0);

        if signing_in {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label(RichText::new("Waiting for the identity provider...").color(TEXT_SECONDARY));
            });
            return;
        }

        let btn = ui.add(
            egui::Button::new(RichText::new("Sign in").color(TEXT_PRIMARY).strong())
                .fill(ACCENT)
                .corner_radius(PANEL_ROUNDING)
                .min_size(Vec2::new(160.0, 36.0)),
        );
        clicked = btn.clicked();
    });
    clicked
}
