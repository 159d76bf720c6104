use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};
use std::time::Instant;

use crate::actions::Action;
use crate::ipc::Connector;
use crate::session::{SessionEngine, PROMPT_TITLE};

/// Theme colors
pub struct Theme {
    pub fg: Color,
    pub accent: Color,
    pub dim: Color,
    pub notice: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: Color::Rgb(220, 220, 220),
            accent: Color::Rgb(217, 119, 87),
            dim: Color::Rgb(100, 100, 100),
            notice: Color::Rgb(255, 193, 7),
        }
    }
}

/// Main application state
pub struct App<C: Connector> {
    /// Protocol engine and everything it shows
    pub engine: SessionEngine<C>,
    /// Theme
    pub theme: Theme,
    /// Pending action queue, for work the main loop has to await
    pub pending_actions: Vec<Action>,
}

impl<C: Connector> App<C> {
    /// Create the app; it binds to the worker on the first pass of the main loop
    pub fn new(engine: SessionEngine<C>) -> Self {
        Self {
            engine,
            theme: Theme::default(),
            pending_actions: vec![Action::Connect],
        }
    }

    /// Take pending actions (drains the queue)
    pub fn take_pending_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending_actions)
    }

    /// Handle an action and return whether to quit
    pub fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::KeyPress(key) => self.handle_key(key),
            Action::Inbound(inbound) => {
                self.engine.dispatch(inbound);
                Ok(false)
            }
            Action::Tick => {
                self.engine.tick(Instant::now());
                Ok(false)
            }
            Action::Connect => {
                self.pending_actions.push(Action::Connect);
                Ok(false)
            }
            Action::Disconnect => {
                self.engine.disconnect();
                Ok(false)
            }
            Action::Quit => Ok(true),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.engine.screen().prompt().is_some() {
            self.handle_prompt_key(key)
        } else {
            self.handle_input_key(key)
        }
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') | KeyCode::Char('q') => return Ok(true),
                KeyCode::Char('r') => self.engine.request_list(),
                KeyCode::Char('o') => self.pending_actions.push(Action::Connect),
                KeyCode::Char('d') => return self.handle_action(Action::Disconnect),
                _ => {}
            }
            return Ok(false);
        }

        match key.code {
            KeyCode::Enter => self.engine.edit_input(|input| input.push('\n')),
            KeyCode::Backspace => self.engine.edit_input(|input| {
                input.pop();
            }),
            KeyCode::Char(c) => self.engine.edit_input(|input| input.push(c)),
            _ => {}
        }
        Ok(false)
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Ok(true);
            }
            KeyCode::Char('j') | KeyCode::Down => {
                if let Some(prompt) = self.engine.screen_mut().prompt_mut() {
                    prompt.next();
                }
            }
            KeyCode::Char('k') | KeyCode::Up => {
                if let Some(prompt) = self.engine.screen_mut().prompt_mut() {
                    prompt.previous();
                }
            }
            KeyCode::Enter => self.engine.choose_selected(),
            KeyCode::Esc => self.engine.cancel_prompt(),
            _ => {}
        }
        Ok(false)
    }

    pub fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Min(0),    // Output
                Constraint::Length(3), // Input
                Constraint::Length(3), // Notice / help
            ])
            .split(frame.area());

        self.render_header(frame, chunks[0]);
        self.render_output(frame, chunks[1]);
        self.render_input(frame, chunks[2]);
        self.render_footer(frame, chunks[3]);

        if self.engine.screen().prompt().is_some() {
            self.render_prompt(frame);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let title = Paragraph::new(Line::from(Span::styled(
            format!(" {} ", self.engine.screen().title),
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.dim)),
        );
        frame.render_widget(title, area);
    }

    fn render_output(&self, frame: &mut Frame, area: Rect) {
        let output = &self.engine.screen().output;

        // Keep the latest output in view
        let visible = area.height.saturating_sub(2) as usize;
        let lines = output.lines().count();
        let scroll = lines.saturating_sub(visible).min(u16::MAX as usize) as u16;

        let paragraph = Paragraph::new(output.as_str())
            .style(Style::default().fg(self.theme.fg))
            .scroll((scroll, 0))
            .block(
                Block::default()
                    .title(" Output ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.dim)),
            );
        frame.render_widget(paragraph, area);
    }

    fn render_input(&self, frame: &mut Frame, area: Rect) {
        let input = Paragraph::new(Line::from(Span::styled(
            format!("▶ {}_", self.engine.screen().input),
            Style::default().fg(self.theme.fg),
        )))
        .block(
            Block::default()
                .title(" Input ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.accent)),
        );
        frame.render_widget(input, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let help_text =
            " Ctrl-R: Run │ Ctrl-O: Connect │ Ctrl-D: Disconnect │ Ctrl-Q: Quit ";

        let content = match self.engine.screen().notice() {
            Some(notice) => Line::from(Span::styled(
                format!(" {} ", notice.text),
                Style::default().fg(self.theme.notice),
            )),
            None => Line::from(Span::styled(help_text, Style::default().fg(self.theme.dim))),
        };

        let footer = Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.dim)),
        );
        frame.render_widget(footer, area);
    }

    fn render_prompt(&self, frame: &mut Frame) {
        let Some(prompt) = self.engine.screen().prompt() else {
            return;
        };
        let area = centered_rect(50, 40, frame.area());

        frame.render_widget(Clear, area);

        let items: Vec<ListItem> = prompt
            .names
            .iter()
            .map(|name| ListItem::new(Span::styled(name.as_str(), Style::default().fg(self.theme.fg))))
            .collect();

        let list = List::new(items)
            .block(
                Block::default()
                    .title(format!(" {} ", PROMPT_TITLE))
                    .title_bottom(" Enter: Run │ Esc: Cancel ")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.accent)),
            )
            .highlight_style(
                Style::default()
                    .bg(Color::Rgb(50, 50, 50))
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        let mut state = ListState::default();
        state.select(Some(prompt.selected));
        frame.render_stateful_widget(list, area, &mut state);
    }
}

/// Helper function to create a centered rectangle
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::memory::{MemoryConnector, MemoryWorker};
    use crate::ipc::{Inbound, Message, MessageKind, ServiceTarget};

    fn key(code: KeyCode) -> Action {
        Action::KeyPress(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(c: char) -> Action {
        Action::KeyPress(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    async fn connected_app(worker: &MemoryWorker) -> App<MemoryConnector> {
        let (engine, _inbox) = SessionEngine::new(
            worker.connector(),
            ServiceTarget::new("pkg", "pkg.Action"),
            "runbridge",
        );
        let mut app = App::new(engine);
        assert!(matches!(
            app.take_pending_actions().as_slice(),
            [Action::Connect]
        ));
        assert!(app.engine.connect().await);
        worker.clear_sent();
        app
    }

    fn inbound(kind: MessageKind, payload: &str) -> Action {
        Action::Inbound(Inbound::Message(Message::new(kind, payload)))
    }

    #[tokio::test]
    async fn test_typing_sends_line_on_enter() {
        let worker = MemoryWorker::new();
        let mut app = connected_app(&worker).await;

        for c in "lss".chars() {
            app.handle_action(key(KeyCode::Char(c))).unwrap();
        }
        app.handle_action(key(KeyCode::Backspace)).unwrap();
        assert_eq!(app.engine.screen().input, "ls");
        assert!(worker.sent().is_empty());

        app.handle_action(key(KeyCode::Enter)).unwrap();
        assert_eq!(worker.sent(), vec![Message::new(MessageKind::Append, "ls\n")]);
        assert!(app.engine.screen().input.is_empty());
    }

    #[tokio::test]
    async fn test_run_key_requests_list() {
        let worker = MemoryWorker::new();
        let mut app = connected_app(&worker).await;

        app.handle_action(ctrl('r')).unwrap();
        assert_eq!(worker.sent_kinds(), vec![MessageKind::List]);
    }

    #[tokio::test]
    async fn test_prompt_keys() {
        let worker = MemoryWorker::new();
        let mut app = connected_app(&worker).await;

        app.handle_action(inbound(MessageKind::List, "a\nb\nc")).unwrap();
        app.handle_action(key(KeyCode::Down)).unwrap();
        app.handle_action(key(KeyCode::Char('j'))).unwrap();
        app.handle_action(key(KeyCode::Char('k'))).unwrap();
        // keys go to the prompt, not the input buffer
        assert!(app.engine.screen().input.is_empty());

        app.handle_action(key(KeyCode::Enter)).unwrap();
        assert_eq!(
            worker.sent(),
            vec![
                Message::empty(MessageKind::Terminate),
                Message::new(MessageKind::Run, "b"),
            ]
        );
    }

    #[tokio::test]
    async fn test_prompt_escape_cancels() {
        let worker = MemoryWorker::new();
        let mut app = connected_app(&worker).await;

        app.handle_action(inbound(MessageKind::List, "a\nb")).unwrap();
        app.handle_action(key(KeyCode::Esc)).unwrap();

        assert!(app.engine.screen().prompt().is_none());
        assert!(worker.sent().is_empty());
    }

    #[tokio::test]
    async fn test_control_keys() {
        let worker = MemoryWorker::new();
        let mut app = connected_app(&worker).await;

        app.handle_action(ctrl('o')).unwrap();
        assert!(matches!(
            app.take_pending_actions().as_slice(),
            [Action::Connect]
        ));

        app.handle_action(ctrl('d')).unwrap();
        assert!(!app.engine.is_connected());

        assert!(app.handle_action(ctrl('q')).unwrap());
        assert!(app.handle_action(Action::Quit).unwrap());
    }

    #[tokio::test]
    async fn test_renders_without_panicking() {
        use ratatui::{backend::TestBackend, Terminal};

        let worker = MemoryWorker::new();
        let mut app = connected_app(&worker).await;
        app.handle_action(inbound(MessageKind::Append, "line one\nline two\n"))
            .unwrap();
        app.handle_action(inbound(MessageKind::Trace, "tracing"))
            .unwrap();
        app.handle_action(inbound(MessageKind::List, "a\nb")).unwrap();

        let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
    }
}
