//! Ticket detail view: body, metadata, thread, related tickets and the
//! technician controls (assign, close, reopen).

use egui::{self, Align, Layout, RichText, ScrollArea, Vec2};
use helpdesk_types::ticket::{format_timestamp, Technician, Ticket, TicketMessage};
use crate::state::UiState;
use crate::theme::*;

pub enum TicketAction {
    Send(String),
    /// `None` clears the assignee
    Assign(Option<String>),
    Close,
    Reopen,
    Open(u64),
    Back,
}

/// Technician id matching the ticket's assignee name, if any.
pub fn current_assignee_id(ticket: &Ticket, technicians: &[Technician]) -> Option<String> {
    let name = ticket.assignee_name.as_deref()?;
    technicians
        .iter()
        .find(|t| t.user_name == name)
        .map(|t| t.user_id.clone())
}

pub fn ticket_detail_panel(ui: &mut egui::Ui, state: &mut UiState) -> Option<TicketAction> {
    let mut action = None;
    let technician = state.is_technician();

    if ui.button("‹ Back").clicked() {
        action = Some(TicketAction::Back);
    }

    let Some(ticket) = state.ticket.clone() else {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(RichText::new("Loading ticket...").color(TEXT_SECONDARY));
        });
        if let Some(error) = &state.last_error {
            ui.label(RichText::new(error).color(ERROR));
        }
        return action;
    };

    ui.horizontal(|ui| {
        ui.heading(
            RichText::new(format!("#{} {}", ticket.ticket_id, ticket.display_title()))
                .color(TEXT_PRIMARY)
                .strong(),
        );
        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if technician {
                if ticket.is_closed() {
                    if ui.button("Reopen Ticket").clicked() {
                        action = Some(TicketAction::Reopen);
                    }
                } else if ui.button("Close Ticket").clicked() {
                    action = Some(TicketAction::Close);
                }
            }
        });
    });

    egui::Grid::new("ticket_meta").num_columns(2).show(ui, |ui| {
        meta_row(ui, "Author", &ticket.author_name);
        meta_row(ui, "Created", &format_timestamp(Some(&ticket.creation_date)));
        meta_row(ui, "Closed", &format_timestamp(ticket.closed_date.as_ref()));

        ui.label(RichText::new("Assignee").color(TEXT_SECONDARY));
        if technician {
            if let Some(next) = assignee_picker(ui, &ticket, &state.technicians) {
                action = Some(TicketAction::Assign(next));
            }
        } else {
            ui.label(RichText::new(ticket.assignee_label()).color(TEXT_PRIMARY));
        }
        ui.end_row();
    });

    ui.separator();

    let closed = ticket.is_closed();
    ScrollArea::vertical()
        .max_height(ui.available_height() - 48.0)
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            egui::Frame::default()
                .fill(BG_SECONDARY)
                .corner_radius(PANEL_ROUNDING)
                .inner_margin(PANEL_PADDING)
                .show(ui, |ui| {
                    ui.set_max_width(CARD_WIDTH);
                    ui.label(RichText::new(ticket.display_body()).color(TEXT_PRIMARY));
                });

            if technician && !ticket.similar_tickets.is_empty() {
                ui.add_space(6.0);
                ui.collapsing("Similar tickets", |ui| {
                    for similar in &ticket.similar_tickets {
                        let label = format!("#{} {}", similar.id, similar.entity.title);
                        if ui.link(label).clicked() {
                            action = Some(TicketAction::Open(similar.id));
                        }
                    }
                });
            }

            ui.add_space(8.0);
            ui.label(RichText::new("Messages").color(ACCENT).strong());
            if ticket.ticket_messages.is_empty() {
                ui.label(RichText::new("No messages yet.").color(TEXT_SECONDARY).italics());
            }
            for message in &ticket.ticket_messages {
                render_message(ui, message);
                ui.add_space(4.0);
            }
        });

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        let hint = if closed { "This ticket is closed." } else { "Write a message..." };
        let input = egui::TextEdit::singleline(&mut state.message_input)
            .hint_text(hint)
            .desired_width(ui.available_width() - 70.0);
        let response = ui.add_enabled(!closed, input);

        let send_enabled = !closed && !state.message_input.trim().is_empty();
        let send_btn = ui.add_enabled(
            send_enabled,
            egui::Button::new(RichText::new("Send").color(TEXT_PRIMARY))
                .fill(if send_enabled { ACCENT } else { BG_SURFACE })
                .corner_radius(PANEL_ROUNDING)
                .min_size(Vec2::new(60.0, 0.0)),
        );
        let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if send_enabled && (enter || send_btn.clicked()) {
            action = Some(TicketAction::Send(state.message_input.trim().to_string()));
            state.message_input.clear();
        }
    });

    action
}

fn meta_row(ui: &mut egui::Ui, label: &str, value: &str) {
    ui.label(RichText::new(label).color(TEXT_SECONDARY));
    ui.label(RichText::new(value).color(TEXT_PRIMARY));
    ui.end_row();
}

fn assignee_picker(
    ui: &mut egui::Ui,
    ticket: &Ticket,
    technicians: &[Technician],
) -> Option<Option<String>> {
    let current = current_assignee_id(ticket, technicians);
    let mut selected = current.clone();
    egui::ComboBox::from_id_salt("ticket_assignee")
        .selected_text(ticket.assignee_label())
        .show_ui(ui, |ui| {
            ui.selectable_value(&mut selected, None, "Unassigned");
            for tech in technicians {
                ui.selectable_value(&mut selected, Some(tech.user_id.clone()), tech.user_name.as_str());
            }
        });
    (selected != current).then_some(selected)
}

fn render_message(ui: &mut egui::Ui, message: &TicketMessage) {
    let from_technician = message.group == "technicians";
    let bg = if from_technician { BG_SECONDARY } else { BG_HUMAN };
    egui::Frame::default()
        .fill(bg)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new(&message.author_name).color(ACCENT).strong().small());
                ui.label(
                    RichText::new(format_timestamp(Some(&message.created_at)))
                        .color(TEXT_SECONDARY)
                        .small(),
                );
            });
            ui.label(RichText::new(&message.message).color(TEXT_PRIMARY));
        });
}
