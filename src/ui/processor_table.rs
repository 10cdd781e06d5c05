use egui::{Color32, ComboBox, Grid, RichText, ScrollArea, TextEdit, Ui};

use crate::{
    editor::RowConfig,
    model::Model,
    project::{
        form::ProcessorForm,
        processor::{Choice, ProcessorType},
    },
    settings::DESCRIPTION_MAX_CHARS,
};

const NUMBER_FIELD_WIDTH: f32 = 56.;
const NUMBER_FIELD_CHARS: usize = 7;

pub fn render_processor_table(model: &mut Model, ui: &mut Ui) {
    let mut select_row: Option<usize> = None;
    let mut chosen_type: Option<(usize, ProcessorType)> = None;
    let mut move_row: Option<(usize, usize)> = None;

    let row_count = model.table.len();
    let selected = model.table.selected();

    if model.table.is_empty() {
        ui.label(RichText::new("No output processors; use Add to create one").color(Color32::GRAY));
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            Grid::new("output_processors")
                .num_columns(6)
                .striped(true)
                .show(ui, |ui| {
                    ui.strong("#");
                    ui.strong("Active");
                    ui.strong("Type");
                    ui.strong("Description");
                    ui.strong("Configuration");
                    ui.label("");
                    ui.end_row();

                    for (index, row) in model.table.rows_mut().iter_mut().enumerate() {
                        if ui
                            .selectable_label(selected == Some(index), format!("{}", row.id + 1))
                            .clicked()
                        {
                            select_row = Some(index);
                        }

                        ui.checkbox(&mut row.active, "");

                        match &row.config {
                            RowConfig::Unselected => {
                                let mut choice: Option<ProcessorType> = None;
                                ComboBox::from_id_source(("type", row.id))
                                    .selected_text("Select a type")
                                    .show_ui(ui, |ui| {
                                        for t in ProcessorType::ALL {
                                            ui.selectable_value(&mut choice, Some(t), t.tag());
                                        }
                                    });
                                if let Some(t) = choice {
                                    chosen_type = Some((index, t));
                                }
                            }
                            RowConfig::Configured(form) => {
                                ui.label(form.processor_type().tag());
                            }
                            RowConfig::Unrecognised { type_name, .. } => {
                                ui.label(RichText::new(type_name).color(Color32::GRAY));
                            }
                        }

                        ui.add(
                            TextEdit::singleline(&mut row.description)
                                .desired_width(240.)
                                .char_limit(DESCRIPTION_MAX_CHARS),
                        );

                        match &mut row.config {
                            RowConfig::Unselected => {
                                ui.label("");
                            }
                            RowConfig::Configured(form) => {
                                ui.horizontal(|ui| render_config(ui, form, row.id));
                            }
                            RowConfig::Unrecognised { type_name, .. } => {
                                ui.label(
                                    RichText::new(format!("unknown type {}", type_name))
                                        .color(Color32::YELLOW),
                                );
                            }
                        }

                        ui.horizontal(|ui| {
                            if ui
                                .add_enabled(index > 0, egui::Button::new("⬆"))
                                .clicked()
                            {
                                move_row = Some((index, index - 1));
                            }
                            if ui
                                .add_enabled(index + 1 < row_count, egui::Button::new("⬇"))
                                .clicked()
                            {
                                move_row = Some((index, index + 1));
                            }
                        });

                        ui.end_row();
                    }
                });
        });

    if let Some(index) = select_row {
        // Clicking the selected row again clears the selection
        if selected == Some(index) {
            model.table.select(None);
        } else {
            model.table.select(Some(index));
        }
    }

    if let Some((index, t)) = chosen_type {
        model.table.set_type(index, t);
    }

    if let Some((from, to)) = move_row {
        model.table.move_row(from, to);
    }
}

/// The type-specific fields of a row
fn render_config(ui: &mut Ui, form: &mut ProcessorForm, row_id: usize) {
    match form {
        ProcessorForm::Remap {
            source,
            destination,
            count,
            loops,
            reverse,
        } => {
            number_field(ui, "Source Channel:", source);
            number_field(ui, "Destination:", destination);
            number_field(ui, "Count:", count);
            number_field(ui, "Loops:", loops);
            choice_field(ui, "Reverse:", reverse, ("reverse", row_id));
        }
        ProcessorForm::Brightness {
            start,
            count,
            brightness,
            gamma,
        } => {
            number_field(ui, "Start Channel:", start);
            number_field(ui, "Channel Count:", count);
            number_field(ui, "Brightness:", brightness)
                .on_hover_text("0 - 100");
            number_field(ui, "Gamma:", gamma).on_hover_text("0.1 - 5.0");
        }
        ProcessorForm::SetValue {
            start,
            count,
            value,
        } => {
            number_field(ui, "Start Channel:", start);
            number_field(ui, "Channel Count:", count);
            number_field(ui, "Value:", value).on_hover_text("0 - 255");
        }
        ProcessorForm::HoldValue { start, count } => {
            number_field(ui, "Start Channel:", start);
            number_field(ui, "Channel Count:", count);
        }
        ProcessorForm::ReorderColors {
            start,
            count,
            color_order,
        } => {
            number_field(ui, "Start Channel:", start);
            number_field(ui, "Nodes:", count);
            choice_field(ui, "Color Order:", color_order, ("colorOrder", row_id));
        }
        ProcessorForm::ThreeToFour {
            start,
            count,
            color_order,
            algorithm,
        } => {
            number_field(ui, "Start Channel:", start);
            number_field(ui, "Nodes:", count);
            choice_field(ui, "Color Order:", color_order, ("colorOrder", row_id));
            choice_field(ui, "Algorithm:", algorithm, ("algorithm", row_id));
        }
    }
}

fn number_field(ui: &mut Ui, label: &str, text: &mut String) -> egui::Response {
    ui.label(label);
    ui.add(
        TextEdit::singleline(text)
            .desired_width(NUMBER_FIELD_WIDTH)
            .char_limit(NUMBER_FIELD_CHARS),
    )
}

fn choice_field<C: Choice>(ui: &mut Ui, label: &str, value: &mut C, id: (&str, usize)) {
    ui.label(label);
    ComboBox::from_id_source(id)
        .selected_text(value.label())
        .show_ui(ui, |ui| {
            for option in C::ALL {
                ui.selectable_value(value, *option, option.label());
            }
        });
}
