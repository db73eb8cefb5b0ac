//! Clinical input form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::application::{ControlKind, InputControl};
use crate::tui::styles::MedicalTheme;

/// What the form needs beyond the controls themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormCursor<'a> {
    /// Index of the focused control
    pub focus: usize,
    /// Uncommitted text typed into the focused control
    pub edit: Option<&'a str>,
}

/// Text shown inside a control.
#[must_use]
pub fn control_text(control: &InputControl, focused: bool) -> String {
    match control.kind {
        ControlKind::Choice { .. } if focused => format!("< {} >", control.value),
        _ => control.value.to_string(),
    }
}

/// Render the input form
pub fn render_form(f: &mut Frame, area: Rect, inputs: &[InputControl], cursor: FormCursor<'_>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Fields
            Constraint::Length(2), // Help for the focused field
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], inputs, cursor);
    render_field_help(f, chunks[2], inputs.get(cursor.focus));
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Patient Inputs", MedicalTheme::title()),
        Span::styled(" │ Diabetes Risk Factors", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, inputs: &[InputControl], cursor: FormCursor<'_>) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    // Categorical fields on the left, measurements on the right
    let mid = inputs.len().div_ceil(2);

    render_field_column(f, columns[0], &inputs[..mid], 0, cursor);
    render_field_column(f, columns[1], &inputs[mid..], mid, cursor);
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    inputs: &[InputControl],
    offset: usize,
    cursor: FormCursor<'_>,
) {
    let field_height = 3;
    let constraints: Vec<Constraint> = inputs
        .iter()
        .map(|_| Constraint::Length(field_height))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, control) in inputs.iter().enumerate() {
        let is_focused = offset + i == cursor.focus;
        let (border_style, title_style) = if is_focused {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", control.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let mut spans = vec![Span::raw(" ")];
        match cursor.edit.filter(|_| is_focused) {
            Some(text) => {
                spans.push(Span::styled(text.to_string(), MedicalTheme::text()));
                spans.push(Span::styled("▌", MedicalTheme::cursor()));
            }
            None => spans.push(Span::styled(
                control_text(control, is_focused),
                MedicalTheme::text(),
            )),
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_field_help(f: &mut Frame, area: Rect, focused: Option<&InputControl>) {
    let Some(control) = focused else {
        return;
    };

    let mut spans = vec![Span::styled(
        format!(" Range: {}", control.key.spec().domain.bounds_hint()),
        MedicalTheme::text_muted(),
    )];
    if let Some(help) = control.help {
        spans.push(Span::styled(format!("  {help}"), MedicalTheme::text_secondary()));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
