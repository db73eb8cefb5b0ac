//! Prediction result panel.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::domain::{FormPhase, Submission, DISCLAIMER};
use crate::tui::styles::MedicalTheme;

/// Render the panel for the current form phase
pub fn render_result(f: &mut Frame, area: Rect, phase: &FormPhase) {
    match phase {
        FormPhase::Idle => render_idle(f, area),
        FormPhase::ResultShown(submission) => render_submission(f, area, submission),
        FormPhase::Failed { message } => render_error(f, area, message),
    }
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "Ready to estimate diabetes risk",
            MedicalTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Review the inputs, then press Enter",
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .title(Span::styled(" Prediction ", MedicalTheme::subtitle()))
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_submission(f: &mut Frame, area: Rect, submission: &Submission) {
    let block = Block::default()
        .title(Span::styled(" Prediction Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let advisory_height = if submission.advisory.is_some() { 3 } else { 0 };
    let summary_height = submission.summary.len() as u16 + 1;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(advisory_height), // Age advisory
            Constraint::Length(summary_height),  // Input summary
            Constraint::Length(3),               // Probability
            Constraint::Length(2),               // Verdict
            Constraint::Min(0),                  // Disclaimer
        ])
        .horizontal_margin(1)
        .split(inner);

    if let Some(advisory) = submission.advisory {
        let warning = Paragraph::new(Line::from(vec![
            Span::styled("! ", MedicalTheme::warning()),
            Span::styled(advisory, MedicalTheme::warning()),
        ]))
        .wrap(Wrap { trim: true });
        f.render_widget(warning, chunks[0]);
    }

    let rows = submission.summary.iter().map(|row| {
        Row::new(vec![
            Cell::from(Span::styled(row.label, MedicalTheme::text_secondary())),
            Cell::from(Span::styled(row.value.clone(), MedicalTheme::text())),
        ])
    });
    let summary = Table::new(rows, [Constraint::Length(17), Constraint::Min(0)]).header(
        Row::new(vec!["Input", "Value"]).style(MedicalTheme::text_muted()),
    );
    f.render_widget(summary, chunks[1]);

    let result = &submission.result;
    let verdict_style = MedicalTheme::verdict(result.verdict());

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Diabetes Probability ", MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(verdict_style)
        .ratio(result.probability.clamp(0.0, 1.0))
        .label(result.percentage());
    f.render_widget(gauge, chunks[2]);

    let verdict = Paragraph::new(Line::from(Span::styled(
        result.verdict().message(),
        verdict_style.add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    f.render_widget(verdict, chunks[3]);

    let caption = Paragraph::new(Line::from(Span::styled(
        DISCLAIMER,
        MedicalTheme::text_muted(),
    )))
    .wrap(Wrap { trim: true });
    f.render_widget(caption, chunks[4]);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Prediction failed", MedicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}
