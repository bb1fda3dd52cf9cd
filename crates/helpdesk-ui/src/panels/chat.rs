//! AI chat view: transcript, input and the ticket hand-off action.

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};
use helpdesk_types::message::{ChatEntry, Speaker};
use crate::state::UiState;
use crate::theme::*;

pub const GENERATING_TICKET_HINT: &str = "Generating ticket … This may take 1-2 minutes";

pub enum ChatAction {
    Send(String),
    CreateTicket,
    Reset,
}

/// Free text is accepted only when idle and no ticket action is waiting.
pub fn input_enabled(state: &UiState) -> bool {
    !state.workflow_busy && !state.transcript.offer_ticket_action
}

/// Render the chat panel. Returns the user's intent, if any.
pub fn chat_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<ChatAction> {
    let mut action = None;

    egui::Frame::default()
        .fill(BG_PRIMARY)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.vertical(|ui| {
                // Header
                ui.horizontal(|ui| {
                    ui.heading(RichText::new("AI Chat").color(TEXT_PRIMARY).strong());
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let reset = ui.add_enabled(!state.workflow_busy, egui::Button::new("Reset Chat"));
                        if reset.clicked() {
                            action = Some(ChatAction::Reset);
                        }
                    });
                });

                ui.separator();

                let available_height = ui.available_height() - 60.0;
                ScrollArea::vertical()
                    .max_height(available_height)
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        if state.transcript.is_empty() {
                            ui.label(
                                RichText::new("Describe your problem and the assistant will help you.")
                                    .color(TEXT_SECONDARY)
                                    .italics(),
                            );
                        }
                        for entry in &state.transcript.entries {
                            render_entry(ui, entry);
                            ui.add_space(4.0);
                        }

                        if state.generating_ticket {
                            ui.horizontal(|ui| {
                                ui.spinner();
                                ui.label(RichText::new(GENERATING_TICKET_HINT).color(WARNING));
                            });
                        } else if state.workflow_busy {
                            ui.spinner();
                        }

                        if state.transcript.offer_ticket_action && !state.workflow_busy {
                            ui.add_space(6.0);
                            let btn = ui.add(
                                egui::Button::new(
                                    RichText::new("Create Ticket").color(TEXT_PRIMARY).strong(),
                                )
                                .fill(ACCENT)
                                .corner_radius(PANEL_ROUNDING)
                                .min_size(Vec2::new(140.0, 28.0)),
                            );
                            if btn.clicked() {
                                state.generating_ticket = true;
                                action = Some(ChatAction::CreateTicket);
                            }
                        }
                    });

                ui.add_space(8.0);

                // Input area
                let enabled = input_enabled(state);
                ui.horizontal(|ui| {
                    let input = egui::TextEdit::singleline(&mut state.chat_input)
                        .hint_text("Type a message...")
                        .desired_width(ui.available_width() - 70.0)
                        .font(egui::FontId::proportional(14.0));
                    let response = ui.add_enabled(enabled, input);

                    let send_enabled = enabled && !state.chat_input.trim().is_empty();
                    let send_btn = ui.add_enabled(
                        send_enabled,
                        egui::Button::new(RichText::new("Send").color(TEXT_PRIMARY))
                            .fill(if send_enabled { ACCENT } else { BG_SURFACE })
                            .corner_radius(PANEL_ROUNDING)
                            .min_size(Vec2::new(60.0, 0.0)),
                    );

                    let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                    if send_enabled && (enter || send_btn.clicked()) {
                        let text = state.chat_input.trim().to_string();
                        state.chat_input.clear();
                        action = Some(ChatAction::Send(text));
                        response.request_focus();
                    }
                });
            });
        });

    action
}

fn render_entry(ui: &mut egui::Ui, entry: &ChatEntry) {
    let (label, label_color, bg) = match entry.speaker {
        Speaker::Human => ("You", ACCENT, BG_HUMAN),
        Speaker::Assistant => ("Assistant", SUCCESS, BG_SECONDARY),
    };
    let text_color = if entry.is_pending() { TEXT_SECONDARY } else { TEXT_PRIMARY };

    egui::Frame::default()
        .fill(bg)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.label(RichText::new(label).color(label_color).strong().small());
            ui.label(RichText::new(&entry.text).color(text_color));
        });
}
