//! Main TUI application state machine.
//!
//! Handles:
//! - Field focus and in-place numeric editing
//! - Input event handling
//! - Translating keys into form actions

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use crate::adapters::LogisticModel;
use crate::application::{ControlKind, FormAction, FormController, FormView};
use crate::config::AppConfig;
use crate::domain::{FieldKey, FormPhase, SessionState};
use crate::ports::Classifier;

use super::styles::MedicalTheme;
use super::ui::{
    form::{render_form, FormCursor},
    render_disclaimer,
    result::render_result,
};

/// Main application state
pub struct App<C: Classifier + ?Sized = LogisticModel> {
    controller: FormController<C>,

    /// The one session this terminal serves
    session: SessionState,

    /// Output of the last render pass
    view: FormView,

    /// Index of the focused control
    focus: usize,

    /// Uncommitted text typed into the focused numeric control
    edit_buffer: Option<String>,

    /// Why the open edit could not be committed
    entry_error: Option<String>,

    should_quit: bool,
}

impl App<LogisticModel> {
    /// Load the classifier named by `config` and build the application.
    ///
    /// # Errors
    /// Returns error if the model cannot be loaded or verified. The form
    /// never starts without a classifier.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let model = load_classifier(&config.model_path).with_context(|| {
            format!(
                "Failed to load model from {:?}. Set {} to a model file or a directory containing model.json.",
                config.model_path,
                crate::config::MODEL_PATH_ENV
            )
        })?;

        Ok(Self::with_classifier(Arc::new(model)))
    }
}

impl<C: Classifier + ?Sized> App<C> {
    /// Create the application around an already-built classifier.
    pub fn with_classifier(classifier: Arc<C>) -> Self {
        let controller = FormController::new(classifier);
        let mut session = SessionState::new();
        let view = controller.render(&mut session, None);

        Self {
            controller,
            session,
            view,
            focus: 0,
            edit_buffer: None,
            entry_error: None,
            should_quit: false,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f))?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Draw the whole screen.
    pub fn draw(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(0),    // Form and result
                Constraint::Length(3), // Key hints
                Constraint::Length(3), // Disclaimer
            ])
            .split(f.area());

        render_title(f, chunks[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(chunks[1]);

        let cursor = FormCursor {
            focus: self.focus,
            edit: self.edit_buffer.as_deref(),
        };
        render_form(f, body[0], &self.view.inputs, cursor);
        render_result(f, body[1], &self.view.phase);

        render_key_hints(
            f,
            chunks[2],
            self.edit_buffer.is_some(),
            self.entry_error.as_deref(),
        );
        render_disclaimer(f, chunks[3]);
    }

    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
            KeyCode::Up | KeyCode::BackTab => {
                if self.commit_edit() {
                    self.prev_field();
                }
            }
            KeyCode::Down | KeyCode::Tab => {
                if self.commit_edit() {
                    self.next_field();
                }
            }
            KeyCode::Left => self.step(-1),
            KeyCode::Right => self.step(1),
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => self.input_char(c),
            KeyCode::Backspace => {
                if let Some(buffer) = self.edit_buffer.as_mut() {
                    buffer.pop();
                    self.entry_error = None;
                }
            }
            KeyCode::Esc => self.discard_edit(),
            KeyCode::Enter | KeyCode::Char('p') | KeyCode::Char('P') => {
                if self.commit_edit() {
                    self.dispatch(FormAction::Submit);
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.discard_edit();
                self.dispatch(FormAction::Reset);
            }
            _ => {}
        }
    }

    #[must_use]
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    #[must_use]
    pub fn view(&self) -> &FormView {
        &self.view
    }

    #[must_use]
    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Whether the last submit produced a result.
    #[must_use]
    pub fn has_result(&self) -> bool {
        matches!(self.view.phase, FormPhase::ResultShown(_))
    }

    fn dispatch(&mut self, action: FormAction) {
        self.view = self.controller.render(&mut self.session, Some(action));
    }

    fn focused_key(&self) -> FieldKey {
        FieldKey::ALL[self.focus % FieldKey::ALL.len()]
    }

    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % FieldKey::ALL.len();
    }

    fn prev_field(&mut self) {
        if self.focus == 0 {
            self.focus = FieldKey::ALL.len() - 1;
        } else {
            self.focus -= 1;
        }
    }

    fn step(&mut self, delta: i32) {
        if !self.commit_edit() {
            return;
        }
        let key = self.focused_key();
        self.dispatch(FormAction::Step { key, delta });
    }

    fn input_char(&mut self, c: char) {
        let Some(control) = self.view.inputs.get(self.focus) else {
            return;
        };
        let ControlKind::Number { integer, .. } = control.kind else {
            return;
        };
        if c == '.' && integer {
            return;
        }

        let buffer = self.edit_buffer.get_or_insert_with(String::new);
        if c == '.' && buffer.contains('.') {
            return;
        }
        buffer.push(c);
        self.entry_error = None;
    }

    fn discard_edit(&mut self) {
        self.edit_buffer = None;
        self.entry_error = None;
    }

    /// Send typed text to the controller, which clamps it into range.
    ///
    /// Returns false, keeping the edit open, when the text is not a number.
    fn commit_edit(&mut self) -> bool {
        let Some(text) = self.edit_buffer.take() else {
            return true;
        };
        if text.is_empty() {
            return true;
        }

        let key = self.focused_key();
        if key.spec().domain.parse_clamped(&text).is_none() {
            self.entry_error = Some(format!(
                "{}: \"{text}\" is not a number",
                key.spec().label
            ));
            self.edit_buffer = Some(text);
            return false;
        }

        self.entry_error = None;
        self.dispatch(FormAction::Enter { key, text });
        true
    }
}

/// Load the bundled classifier adapter.
fn load_classifier(path: &Path) -> crate::Result<LogisticModel> {
    Ok(LogisticModel::load(path)?)
}

fn render_title(f: &mut Frame, area: Rect) {
    let title = Paragraph::new(Line::from(vec![
        Span::styled(" Diabetes Risk Predictor", MedicalTheme::title()),
        Span::styled(
            " │ Enter patient information to estimate diabetes risk",
            MedicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(title, area);
}

fn render_key_hints(f: &mut Frame, area: Rect, editing: bool, error: Option<&str>) {
    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    if let Some(err) = error {
        let line = Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.to_string(), MedicalTheme::danger()),
            Span::styled("  [Esc] ", MedicalTheme::key_hint()),
            Span::styled("Cancel edit", MedicalTheme::key_desc()),
        ]);
        f.render_widget(Paragraph::new(line).block(block), area);
        return;
    }

    let mut spans = vec![
        Span::styled("[↑↓] ", MedicalTheme::key_hint()),
        Span::styled("Navigate ", MedicalTheme::key_desc()),
        Span::styled("[←→] ", MedicalTheme::key_hint()),
        Span::styled("Change ", MedicalTheme::key_desc()),
        Span::styled("[Enter] ", MedicalTheme::key_hint()),
        Span::styled("Predict ", MedicalTheme::key_desc()),
        Span::styled("[R] ", MedicalTheme::key_hint()),
        Span::styled("Reset ", MedicalTheme::key_desc()),
    ];
    if editing {
        spans.push(Span::styled("[Esc] ", MedicalTheme::key_hint()));
        spans.push(Span::styled("Cancel edit ", MedicalTheme::key_desc()));
    }
    spans.push(Span::styled("[Q] ", MedicalTheme::key_hint()));
    spans.push(Span::styled("Quit", MedicalTheme::key_desc()));

    f.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}
