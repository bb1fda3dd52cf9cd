//! Top navigation bar.

use egui::{self, Align, Layout, RichText};
use helpdesk_types::route::Route;
use crate::state::UiState;
use crate::theme::*;

pub enum NavAction {
    Go(Route),
    SignOut,
}

/// Routes the signed-in user may pick from the bar.
pub fn visible_routes(is_technician: bool) -> Vec<Route> {
    Route::nav_items()
        .iter()
        .copied()
        .filter(|r| *r != Route::TechnicianPortal || is_technician)
        .collect()
}

pub fn nav_bar(ui: &mut egui::Ui, state: &UiState) -> Option<NavAction> {
    let mut action = None;
    ui.horizontal(|ui| {
        ui.label(RichText::new("Helpdesk").strong().color(ACCENT).size(16.0));
        ui.separator();

        for route in visible_routes(state.is_technician()) {
            if ui
                .selectable_label(state.route == route, route.label())
                .clicked()
            {
                action = Some(NavAction::Go(route));
            }
        }

        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if ui.button("Sign out").clicked() {
                action = Some(NavAction::SignOut);
            }
            if let Some(identity) = &state.identity {
                ui.label(
                    RichText::new(format!("{} ({})", identity.user_name, identity.group.label()))
                        .color(TEXT_SECONDARY)
                        .small(),
                );
            }
        });
    });
    action
}
