//! Ticket list views: the technician backlog (with filter bar) and the
//! caller's own tickets.

use egui::{self, Align, Layout, RichText, ScrollArea};
use helpdesk_types::{
    filter::{SortOrder, TicketFilter},
    ticket::{format_timestamp, Technician, Ticket, TicketList},
};
use crate::theme::*;

/// Assignee filter value the backend reads as "no assignee".
pub const UNASSIGNED_FILTER: &str = "unassigned";

pub enum TicketListAction {
    Open(u64),
    /// Replace the whole filter predicate
    SetFilter(TicketFilter),
    Page(u32),
    Refresh,
}

/// Filter controls for the backlog view
pub struct FilterBar<'a> {
    pub filter: &'a TicketFilter,
    pub technicians: &'a [Technician],
    pub search: &'a mut String,
}

pub struct ListView<'a> {
    pub title: &'a str,
    pub list: Option<&'a TicketList>,
    pub page: u32,
    pub page_size: u32,
    pub error: Option<&'a str>,
    pub filter: Option<FilterBar<'a>>,
}

/// Assignee choices: everyone, nobody, then each technician.
pub fn assignee_options(technicians: &[Technician]) -> Vec<(Option<String>, String)> {
    let mut options = vec![
        (None, "All".to_string()),
        (Some(UNASSIGNED_FILTER.to_string()), "Unassigned".to_string()),
    ];
    options.extend(
        technicians
            .iter()
            .map(|t| (Some(t.user_id.clone()), t.user_name.clone())),
    );
    options
}

pub fn assignee_label(filter: &TicketFilter, technicians: &[Technician]) -> String {
    assignee_options(technicians)
        .into_iter()
        .find(|(id, _)| *id == filter.assignee_id)
        .map(|(_, label)| label)
        .unwrap_or_else(|| filter.assignee_id.clone().unwrap_or_default())
}

pub fn order_label(order: Option<SortOrder>) -> &'static str {
    order.map(|o| o.label()).unwrap_or("Newest first")
}

pub fn ticket_list_panel(ui: &mut egui::Ui, view: ListView<'_>) -> Option<TicketListAction> {
    let mut action = None;

    ui.horizontal(|ui| {
        ui.heading(RichText::new(view.title).color(TEXT_PRIMARY).strong());
        ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
            if ui.button("Refresh").clicked() {
                action = Some(TicketListAction::Refresh);
            }
        });
    });
    ui.separator();

    if let Some(bar) = view.filter {
        if let Some(next) = filter_bar(ui, bar) {
            action = Some(TicketListAction::SetFilter(next));
        }
        ui.separator();
    }

    if let Some(error) = view.error {
        ui.label(RichText::new(error).color(ERROR));
    }

    let Some(list) = view.list else {
        ui.spinner();
        return action;
    };

    let page_count = list.page_count(view.page_size);
    ScrollArea::vertical()
        .max_height(ui.available_height() - 40.0)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            if list.tickets.is_empty() {
                ui.label(RichText::new("No tickets found.").color(TEXT_SECONDARY).italics());
            }
            for ticket in &list.tickets {
                if ticket_card(ui, ticket) {
                    action = Some(TicketListAction::Open(ticket.ticket_id));
                }
                ui.add_space(6.0);
            }
        });

    if let Some(page) = pagination(ui, view.page, page_count, list.count) {
        action = Some(TicketListAction::Page(page));
    }
    action
}

fn filter_bar(ui: &mut egui::Ui, bar: FilterBar<'_>) -> Option<TicketFilter> {
    let mut next = None;
    ui.horizontal_wrapped(|ui| {
        let mut closed = bar.filter.closed;
        egui::ComboBox::from_id_salt("filter_status")
            .selected_text(bar.filter.status_label())
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut closed, None, "All");
                ui.selectable_value(&mut closed, Some(false), "Opened");
                ui.selectable_value(&mut closed, Some(true), "Closed");
            });
        if closed != bar.filter.closed {
            next = Some(bar.filter.with_closed(closed));
        }

        let mut assignee = bar.filter.assignee_id.clone();
        egui::ComboBox::from_id_salt("filter_assignee")
            .selected_text(assignee_label(bar.filter, bar.technicians))
            .show_ui(ui, |ui| {
                for (id, label) in assignee_options(bar.technicians) {
                    ui.selectable_value(&mut assignee, id, label);
                }
            });
        if assignee != bar.filter.assignee_id {
            next = Some(bar.filter.with_assignee(assignee));
        }

        let mut order = bar.filter.order;
        egui::ComboBox::from_id_salt("filter_order")
            .selected_text(order_label(order))
            .show_ui(ui, |ui| {
                ui.selectable_value(&mut order, None, order_label(None));
                ui.selectable_value(&mut order, Some(SortOrder::Desc), SortOrder::Desc.label());
                ui.selectable_value(&mut order, Some(SortOrder::Asc), SortOrder::Asc.label());
            });
        if order != bar.filter.order {
            next = Some(bar.filter.with_order(order));
        }

        let response = ui.add(
            egui::TextEdit::singleline(&mut *bar.search)
                .hint_text("Search tickets...")
                .desired_width(220.0),
        );
        let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        if enter || ui.button("Search").clicked() {
            let candidate = bar.filter.with_search(bar.search.trim());
            if candidate != *bar.filter {
                next = Some(candidate);
            }
        }
    });
    next
}

/// One ticket summary card. Returns true when clicked.
fn ticket_card(ui: &mut egui::Ui, ticket: &Ticket) -> bool {
    let mut open = false;
    egui::Frame::default()
        .fill(BG_SECONDARY)
        .corner_radius(PANEL_ROUNDING)
        .inner_margin(PANEL_PADDING)
        .show(ui, |ui| {
            ui.set_max_width(CARD_WIDTH);
            ui.horizontal(|ui| {
                ui.label(
                    RichText::new(format!("#{}", ticket.ticket_id))
                        .color(TEXT_SECONDARY)
                        .monospace(),
                );
                ui.label(RichText::new(ticket.display_title()).color(TEXT_PRIMARY).strong());
                ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                    if ui.button("Open").clicked() {
                        open = true;
                    }
                    let status = if ticket.is_closed() { "Closed" } else { "Open" };
                    ui.label(RichText::new(status).color(status_color(ticket.is_closed())).small());
                });
            });
            let summary = ticket.summary();
            if !summary.is_empty() {
                ui.label(RichText::new(summary).color(TEXT_SECONDARY));
            }
            ui.label(
                RichText::new(format!(
                    "{} · {} · Assignee: {}",
                    ticket.author_name,
                    format_timestamp(Some(&ticket.creation_date)),
                    ticket.assignee_label()
                ))
                .color(TEXT_SECONDARY)
                .small(),
            );
        });
    open
}

/// Previous/next controls. Returns the requested page.
fn pagination(ui: &mut egui::Ui, page: u32, page_count: u32, total: u64) -> Option<u32> {
    let mut target = None;
    ui.horizontal(|ui| {
        if ui.add_enabled(page > 1, egui::Button::new("‹ Prev")).clicked() {
            target = Some(page - 1);
        }
        ui.label(
            RichText::new(format!("Page {} of {} ({} tickets)", page, page_count, total))
                .color(TEXT_SECONDARY),
        );
        if ui
            .add_enabled(page < page_count, egui::Button::new("Next ›"))
            .clicked()
        {
            target = Some(page + 1);
        }
    });
    target
}
