use egui::{Color32, RichText, Vec2};
use log::{debug, error, info};

use crate::model::{Model, Notice};

use self::processor_table::render_processor_table;

mod processor_table;

pub const EDITOR_WINDOW: Vec2 = Vec2::new(1280., 720.);

pub fn render_gui(model: &mut Model, ctx: &eframe::egui::Context, frame: &mut eframe::Frame) {
    model.update();

    if model.requests_in_flight > 0 {
        ctx.request_repaint();
    }

    render_toolbar(model, ctx, frame);

    egui::CentralPanel::default().show(ctx, |ui| {
        render_processor_table(model, ui);
    });

    let mut dismiss = false;
    if let Some(Notice::Error { title, message }) = &model.notice {
        egui::Window::new(title.as_str())
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                for line in message.lines() {
                    ui.label(RichText::new(line).color(Color32::LIGHT_RED));
                }
                if ui.button("OK").clicked() {
                    dismiss = true;
                }
            });
    }
    if dismiss {
        model.notice = None;
    }
}

pub fn render_toolbar(model: &mut Model, ctx: &eframe::egui::Context, _frame: &mut eframe::Frame) {
    egui::TopBottomPanel::top("Toolbar")
        .min_height(32.)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Output Processors");
                ui.label("|");
                if ui.button("Save").clicked() {
                    if let Err(report) = model.request_save() {
                        debug!("Save refused with {} problem(s)", report.0.len());
                    }
                }
                if ui.button("Add").clicked() {
                    model.table.add_row();
                }
                if ui
                    .add_enabled(model.table.selected().is_some(), egui::Button::new("Delete"))
                    .clicked()
                {
                    model.table.delete_selected();
                }
                if ui.button("Reload").clicked() {
                    model.request_load();
                }
                ui.label("|");
                if ui.button("Import...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("text", &["json"])
                        .pick_file()
                    {
                        if let Err(e) = model.import_from(&path.display().to_string()) {
                            error!(
                                "Failed to import output processors from \"{}\"; {:?}",
                                &path.display(),
                                e
                            );
                        }
                    }
                }
                if ui.button("Export...").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("text", &["json"])
                        .save_file()
                    {
                        match model.export_to(&path.display().to_string()) {
                            Ok(()) => {
                                info!("Exported OK!");
                            }
                            Err(e) => {
                                error!("Error exporting output processors: {}", e);
                                model.notice = Some(Notice::Error {
                                    title: String::from("Export Output Processors"),
                                    message: e.to_string(),
                                });
                            }
                        }
                    }
                }
                ui.label(
                    RichText::new(model.store.describe())
                        .color(Color32::WHITE)
                        .italics()
                        .small(),
                );
            });
            ui.horizontal(|ui| {
                if model.requests_in_flight > 0 {
                    ui.spinner();
                }
                if let Some(Notice::Info(text)) = &model.notice {
                    ui.label(RichText::new(text).color(Color32::LIGHT_GREEN));
                }
                if model.restart_required {
                    ui.label(
                        RichText::new("Restart required for changes to take effect")
                            .color(Color32::YELLOW),
                    );
                }
            });
        });
}
