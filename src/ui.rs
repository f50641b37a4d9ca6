use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use crate::database::Database;
use crate::form::{FormField, FormOutcome, TaskForm};
use crate::llm::{AiError, AiReply, Advisor};
use crate::models::{ChatMessage, ChatRole, PopupMode, Priority, Status, Task, TaskFilter};
use crate::pomodoro::{Pomodoro, SoundNotifier, TimerMode};
use crate::router::{View, ViewRouter};
use crate::search::filter_tasks;
use crate::stats::TaskStats;
use crate::store::TaskStore;

const TICK_RATE: Duration = Duration::from_millis(100);
const RECENT_TASKS: usize = 5;

const ADVICE_APOLOGY: &str = "Failed to connect to TaskPilot AI.";
const CHAT_APOLOGY: &str = "Sorry, I lost connection to the server.";
const CHAT_GREETING: &str = "Hi! I am TaskPilot AI. How can I help you be more productive today?";

/// What an in-flight AI request belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AiTarget {
    Advice(String),
    Chat,
}

struct AiEvent {
    target: AiTarget,
    result: Result<String, AiError>,
}

pub struct App {
    store: TaskStore<Database>,
    router: ViewRouter,
    pomodoro: Pomodoro,
    advisor: Advisor,
    runtime: tokio::runtime::Handle,
    replies_tx: Sender<AiEvent>,
    replies_rx: Receiver<AiEvent>,
    pub list_state: ListState,
    pub filter: TaskFilter,
    pub search_query: String,
    pub popup_mode: PopupMode,
    pub form: Option<TaskForm>,
    /// Advice panel of the task currently in detail, keyed by task id.
    pub advice: Option<(String, AiReply)>,
    pub chat_messages: Vec<ChatMessage>,
    pub chat_input: String,
    pub chat_state: AiReply,
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl App {
    pub fn new(store: TaskStore<Database>, advisor: Advisor, runtime: tokio::runtime::Handle) -> Self {
        let (replies_tx, replies_rx) = mpsc::channel();
        let mut app = App {
            store,
            router: ViewRouter::new(),
            pomodoro: Pomodoro::new(Box::new(SoundNotifier)),
            advisor,
            runtime,
            replies_tx,
            replies_rx,
            list_state: ListState::default(),
            filter: TaskFilter::All,
            search_query: String::new(),
            popup_mode: PopupMode::None,
            form: None,
            advice: None,
            chat_messages: vec![ChatMessage::new(ChatRole::Assistant, CHAT_GREETING)],
            chat_input: String::new(),
            chat_state: AiReply::Idle,
            status_message: None,
            should_quit: false,
        };
        app.clamp_selection();
        app
    }

    pub fn view(&self) -> View {
        self.router.current()
    }

    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(self.store.snapshot())
    }

    /// Tasks listed by the current view, in display order.
    pub fn visible_tasks(&self) -> Vec<&Task> {
        let snapshot = self.store.snapshot();
        match self.router.current() {
            View::Dashboard => snapshot.iter().take(RECENT_TASKS).collect(),
            View::AllTasks => filter_tasks(snapshot, self.filter, &self.search_query),
            View::Pomodoro | View::TaskDetail => Vec::new(),
        }
    }

    pub fn selected_task(&self) -> Option<&Task> {
        match self.router.current() {
            View::TaskDetail => self.router.selected().and_then(|id| self.store.get(id)),
            _ => self
                .list_state
                .selected()
                .and_then(|i| self.visible_tasks().get(i).copied()),
        }
    }

    fn selected_task_id(&self) -> Option<String> {
        self.selected_task().map(|t| t.id.clone())
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            self.list_state.select(None);
        } else {
            let i = self.list_state.selected().unwrap_or(0).min(len - 1);
            self.list_state.select(Some(i));
        }
    }

    pub fn navigate(&mut self, view: View) {
        // Advice lives with the detail view; replies arriving later are dropped
        if self.router.current() == View::TaskDetail {
            self.advice = None;
        }
        self.router.navigate(view);
        self.list_state.select(Some(0));
        self.clamp_selection();
    }

    pub fn next_view(&mut self) {
        let i = View::NAV.iter().position(|v| *v == self.view()).map_or(0, |i| i + 1);
        self.navigate(View::NAV[i % View::NAV.len()]);
    }

    pub fn previous_view(&mut self) {
        let len = View::NAV.len();
        let i = View::NAV.iter().position(|v| *v == self.view()).unwrap_or(0);
        self.navigate(View::NAV[(i + len - 1) % len]);
    }

    pub fn next_item(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn previous_item(&mut self) {
        let len = self.visible_tasks().len();
        if len == 0 {
            return;
        }
        let i = match self.list_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.list_state.select(Some(i));
    }

    pub fn open_selected_task(&mut self) {
        if let Some(id) = self.selected_task_id() {
            self.router.open_task(&id, &self.store);
            if self.advice.as_ref().map(|(advice_id, _)| advice_id != &id).unwrap_or(false) {
                self.advice = None;
            }
        }
    }

    fn after_mutation(&mut self, result: Result<()>) {
        if let Err(e) = result {
            log::error!("{:#}", e);
            self.status_message = Some(format!("Error: {:#}", e));
        }
        self.router.resolve(&self.store);
        self.clamp_selection();
    }

    pub fn toggle_selected(&mut self) {
        let Some(id) = self.selected_task_id() else {
            return;
        };
        let result = self.store.toggle_status(&id).map(|status| {
            if let Some(status) = status {
                self.status_message = Some(format!("Task marked {}", status));
            }
        });
        self.after_mutation(result);
    }

    pub fn delete_task(&mut self, id: &str) {
        let result = self.store.remove(id).map(|removed| {
            if removed {
                self.status_message = Some("Task deleted".to_string());
            }
        });
        self.router.task_removed(id);
        if self.advice.as_ref().is_some_and(|(advice_id, _)| advice_id == id) {
            self.advice = None;
        }
        self.after_mutation(result);
    }

    pub fn open_new_task_form(&mut self) {
        self.form = Some(TaskForm::new());
        self.popup_mode = PopupMode::TaskForm;
    }

    pub fn open_edit_task_form(&mut self) {
        if let Some(task) = self.selected_task() {
            self.form = Some(TaskForm::edit(task));
            self.popup_mode = PopupMode::TaskForm;
        }
    }

    pub fn submit_form(&mut self) {
        let Some(outcome) = self.form.as_mut().and_then(|form| form.submit()) else {
            return;
        };

        let result = match outcome {
            FormOutcome::Create(draft) => self.store.add(draft).map(|task| {
                self.status_message = Some(format!("Added '{}'", task.title));
            }),
            FormOutcome::Update(task) => self.store.update(task).map(|_| {
                self.status_message = Some("Task updated".to_string());
            }),
        };
        self.close_popup();
        self.after_mutation(result);
    }

    pub fn close_popup(&mut self) {
        self.popup_mode = PopupMode::None;
        self.form = None;
    }

    pub fn open_chat(&mut self) {
        self.popup_mode = PopupMode::Chat;
    }

    pub fn request_advice(&mut self) {
        let Some(task) = self.selected_task().cloned() else {
            return;
        };
        if let Some((id, reply)) = &self.advice {
            if *id == task.id && reply.is_pending() {
                return;
            }
        }

        self.advice = Some((task.id.clone(), AiReply::Pending));
        let advisor = self.advisor.clone();
        let tx = self.replies_tx.clone();
        self.runtime.spawn(async move {
            let result = advisor.get_task_advice(&task).await;
            let _ = tx.send(AiEvent {
                target: AiTarget::Advice(task.id),
                result,
            });
        });
    }

    pub fn send_chat(&mut self) {
        let message = self.chat_input.trim().to_string();
        if message.is_empty() || self.chat_state.is_pending() {
            return;
        }

        self.chat_messages.push(ChatMessage::new(ChatRole::User, message.clone()));
        self.chat_input.clear();
        self.chat_state = AiReply::Pending;

        let context = self.stats().summary();
        let advisor = self.advisor.clone();
        let tx = self.replies_tx.clone();
        self.runtime.spawn(async move {
            let result = advisor.chat_with_ai(&message, &context).await;
            let _ = tx.send(AiEvent {
                target: AiTarget::Chat,
                result,
            });
        });
    }

    fn drain_ai_replies(&mut self) {
        while let Ok(event) = self.replies_rx.try_recv() {
            match event.target {
                AiTarget::Advice(id) => match &mut self.advice {
                    Some((current, reply)) if *current == id => {
                        *reply = AiReply::from_result(event.result, ADVICE_APOLOGY);
                    }
                    // User moved on; drop the answer
                    _ => log::debug!("discarding advice for task {}", id),
                },
                AiTarget::Chat => {
                    self.chat_state = AiReply::from_result(event.result, CHAT_APOLOGY);
                    if let Some(text) = self.chat_state.text() {
                        self.chat_messages.push(ChatMessage::new(ChatRole::Assistant, text));
                    }
                }
            }
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        if let Some(mode) = self.pomodoro.poll(now) {
            self.status_message = Some(match mode {
                TimerMode::Break => "Focus session complete. Time for a break!".to_string(),
                TimerMode::Focus => "Break is over. Ready to focus?".to_string(),
            });
        }
        self.drain_ai_replies();
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return;
        }

        match self.popup_mode.clone() {
            PopupMode::TaskForm => self.handle_form_key(key.code),
            PopupMode::ConfirmDelete(id) => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => {
                    self.popup_mode = PopupMode::None;
                    self.delete_task(&id);
                }
                KeyCode::Char('n') | KeyCode::Esc => self.close_popup(),
                _ => {}
            },
            PopupMode::Search => match key.code {
                KeyCode::Esc => {
                    self.search_query.clear();
                    self.popup_mode = PopupMode::None;
                    self.clamp_selection();
                }
                KeyCode::Enter => self.popup_mode = PopupMode::None,
                KeyCode::Backspace => {
                    self.search_query.pop();
                    self.list_state.select(Some(0));
                    self.clamp_selection();
                }
                KeyCode::Char(c) => {
                    self.search_query.push(c);
                    self.list_state.select(Some(0));
                    self.clamp_selection();
                }
                _ => {}
            },
            PopupMode::Chat => match key.code {
                KeyCode::Esc => self.popup_mode = PopupMode::None,
                KeyCode::Enter => self.send_chat(),
                KeyCode::Backspace => {
                    self.chat_input.pop();
                }
                KeyCode::Char(c) => self.chat_input.push(c),
                _ => {}
            },
            PopupMode::None => self.handle_normal_key(key.code),
        }
    }

    fn handle_form_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => return self.close_popup(),
            KeyCode::Enter => return self.submit_form(),
            _ => {}
        }

        let Some(form) = self.form.as_mut() else {
            self.close_popup();
            return;
        };
        match code {
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Left if form.focus == FormField::Priority => form.cycle_priority(false),
            KeyCode::Right if form.focus == FormField::Priority => form.cycle_priority(true),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char(c) => form.insert_char(c),
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) {
        self.status_message = None;

        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.navigate(View::Dashboard),
            KeyCode::Char('2') => self.navigate(View::AllTasks),
            KeyCode::Char('3') => self.navigate(View::Pomodoro),
            KeyCode::Tab => self.next_view(),
            KeyCode::BackTab => self.previous_view(),
            KeyCode::Char('n') => self.open_new_task_form(),
            KeyCode::Char('a') => self.open_chat(),
            _ => match self.view() {
                View::Dashboard => self.handle_list_key(code),
                View::AllTasks => match code {
                    KeyCode::Char('f') => {
                        self.filter = self.filter.next();
                        self.list_state.select(Some(0));
                        self.clamp_selection();
                    }
                    KeyCode::Char('/') => self.popup_mode = PopupMode::Search,
                    KeyCode::Char('d') | KeyCode::Delete => {
                        if let Some(id) = self.selected_task_id() {
                            self.delete_task(&id);
                        }
                    }
                    _ => self.handle_list_key(code),
                },
                View::Pomodoro => {
                    let now = Instant::now();
                    match code {
                        KeyCode::Char(' ') | KeyCode::Char('s') => self.pomodoro.toggle(now),
                        KeyCode::Char('r') => self.pomodoro.reset(),
                        KeyCode::Char('m') => self.pomodoro.switch_mode(),
                        _ => {}
                    }
                }
                View::TaskDetail => match code {
                    KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => {
                        self.navigate(View::Dashboard)
                    }
                    KeyCode::Char(' ') | KeyCode::Char('x') => self.toggle_selected(),
                    KeyCode::Char('e') => self.open_edit_task_form(),
                    KeyCode::Char('i') => self.request_advice(),
                    KeyCode::Char('d') | KeyCode::Delete => {
                        if let Some(id) = self.selected_task_id() {
                            self.popup_mode = PopupMode::ConfirmDelete(id);
                        }
                    }
                    _ => {}
                },
            },
        }
    }

    fn handle_list_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Down | KeyCode::Char('j') => self.next_item(),
            KeyCode::Up | KeyCode::Char('k') => self.previous_item(),
            KeyCode::Enter => self.open_selected_task(),
            KeyCode::Char(' ') | KeyCode::Char('x') => self.toggle_selected(),
            _ => {}
        }
    }
}

pub fn run_tui(store: TaskStore<Database>, advisor: Advisor, runtime: tokio::runtime::Handle) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(store, advisor, runtime);
    let res = run_app(&mut terminal, &mut app);
    app.pomodoro.teardown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("TUI loop failed: {:?}", err);
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, app))?;

        let timeout = TICK_RATE.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if last_tick.elapsed() >= TICK_RATE {
            app.on_tick(Instant::now());
            last_tick = Instant::now();
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)].as_ref())
        .split(f.area());

    let titles: Vec<Line> = View::NAV
        .iter()
        .enumerate()
        .map(|(i, v)| Line::from(format!("{} {}", i + 1, v.title())))
        .collect();
    let selected_tab = View::NAV
        .iter()
        .position(|v| *v == app.view())
        .unwrap_or(View::NAV.len());

    let mut header_title = "TaskPilot".to_string();
    if app.pomodoro.is_running() {
        header_title = format!("TaskPilot | {} {}", app.pomodoro.mode().label(), app.pomodoro.format_clock());
    }

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title(header_title))
        .select(selected_tab)
        .style(Style::default().fg(Color::Cyan))
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::Black),
        );
    f.render_widget(tabs, chunks[0]);

    match app.view() {
        View::Dashboard => render_dashboard(f, app, chunks[1]),
        View::AllTasks => render_all_tasks(f, app, chunks[1]),
        View::Pomodoro => render_pomodoro(f, app, chunks[1]),
        View::TaskDetail => render_task_detail(f, app, chunks[1]),
    }

    render_footer(f, app, chunks[2]);

    match app.popup_mode.clone() {
        PopupMode::TaskForm => render_form(f, app),
        PopupMode::ConfirmDelete(_) => {
            let popup_area = centered_rect(40, 20, f.area());
            let block = Block::default()
                .title("Delete Task")
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::DarkGray));
            let content = Paragraph::new("Are you sure?\n\ny: Delete\nn/ESC: Cancel")
                .block(block)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::White));
            f.render_widget(Clear, popup_area);
            f.render_widget(content, popup_area);
        }
        PopupMode::Chat => render_chat(f, app),
        PopupMode::Search | PopupMode::None => {}
    }
}

// Helper function to create centered rectangles for popups
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

fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::High => Color::Red,
        Priority::Moderate => Color::Yellow,
        Priority::Low => Color::Blue,
    }
}

fn task_item(task: &Task) -> ListItem<'static> {
    let (check, check_color) = match task.status {
        Status::Completed => ("[x] ", Color::Green),
        Status::Pending => ("[ ] ", Color::DarkGray),
    };
    let title_style = if task.is_completed() {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(Color::White)
    };

    ListItem::new(Line::from(vec![
        Span::styled(check, Style::default().fg(check_color)),
        Span::styled(format!("{} ", task.title), title_style),
        Span::styled(
            format!("[{}] ", task.priority),
            Style::default().fg(priority_color(task.priority)),
        ),
        Span::styled(format!("Due {}", task.due_date), Style::default().fg(Color::Gray)),
    ]))
}

fn task_list<'a>(items: Vec<ListItem<'a>>, title: String) -> List<'a> {
    List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(
            Style::default()
                .bg(Color::LightGreen)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">> ")
}

fn render_dashboard(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)].as_ref())
        .split(area);

    let stats = app.stats();
    let cards = [
        ("Total Tasks", stats.total, Color::Cyan),
        ("Completed", stats.completed, Color::Green),
        ("Pending", stats.pending, Color::Yellow),
        ("High Priority", stats.high_priority, Color::Red),
    ];
    let card_areas = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4].as_ref())
        .split(chunks[0]);

    for ((label, value, color), card_area) in cards.iter().zip(card_areas.iter()) {
        let card = Paragraph::new(Line::from(Span::styled(
            value.to_string(),
            Style::default().fg(*color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(*label));
        f.render_widget(card, *card_area);
    }

    let items: Vec<ListItem> = app.visible_tasks().into_iter().map(task_item).collect();
    if items.is_empty() {
        let empty = Paragraph::new("No tasks yet. Press 'n' to create your first task.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("Recent Tasks"));
        f.render_widget(empty, chunks[1]);
        return;
    }

    let list = task_list(items, "Recent Tasks".to_string());
    f.render_stateful_widget(list, chunks[1], &mut app.list_state);
}

fn render_all_tasks(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let filter_titles: Vec<Line> = TaskFilter::ALL.iter().map(|f| Line::from(f.label())).collect();
    let filter_index = TaskFilter::ALL.iter().position(|f| *f == app.filter).unwrap_or(0);

    let search_label = if app.popup_mode == PopupMode::Search {
        format!("Filter (f) | Search: {}_", app.search_query)
    } else if app.search_query.is_empty() {
        "Filter (f) | Search (/)".to_string()
    } else {
        format!("Filter (f) | Search: {}", app.search_query)
    };

    let filters = Tabs::new(filter_titles)
        .block(Block::default().borders(Borders::ALL).title(search_label))
        .select(filter_index)
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(filters, chunks[0]);

    let items: Vec<ListItem> = app.visible_tasks().into_iter().map(task_item).collect();
    if items.is_empty() {
        let empty = Paragraph::new("No tasks found\n\nTry changing your filters or create a new task with 'n'.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("All Tasks"));
        f.render_widget(empty, chunks[1]);
        return;
    }

    let title = format!("All Tasks ({})", items.len());
    let list = task_list(items, title);
    f.render_stateful_widget(list, chunks[1], &mut app.list_state);
}

fn render_task_detail(f: &mut Frame, app: &mut App, area: Rect) {
    let Some(task) = app.selected_task() else {
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
        .split(area);

    let status_color = match task.status {
        Status::Completed => Color::Green,
        Status::Pending => Color::Yellow,
    };
    let description = if task.description.is_empty() {
        "No description provided for this task.".to_string()
    } else {
        task.description.clone()
    };

    let lines = vec![
        Line::from(Span::styled(
            task.title.clone(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("Status: "),
            Span::styled(task.status.to_string(), Style::default().fg(status_color)),
        ]),
        Line::from(vec![
            Span::raw("Priority: "),
            Span::styled(
                format!("{} Priority", task.priority),
                Style::default().fg(priority_color(task.priority)),
            ),
        ]),
        Line::from(format!("Due {}", task.due_date)),
        Line::from(format!("Created {}", task.created_date())),
        Line::from(""),
        Line::from(description),
    ];

    let details = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Task Details"));
    f.render_widget(details, chunks[0]);

    let advice_text = match &app.advice {
        Some((id, reply)) if *id == task.id => match reply {
            AiReply::Pending => "Thinking...".to_string(),
            AiReply::Succeeded(text) | AiReply::Failed(text) => text.clone(),
            AiReply::Idle => String::new(),
        },
        _ => "Get personalized strategies to tackle this task. Press 'i' to ask TaskPilot AI.".to_string(),
    };

    let advice = Paragraph::new(advice_text)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("AI Strategy"))
        .style(Style::default().fg(Color::White));
    f.render_widget(advice, chunks[1]);
}

fn render_pomodoro(f: &mut Frame, app: &mut App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(0),
        ].as_ref())
        .split(area);

    let timer = &app.pomodoro;
    let mode_color = match timer.mode() {
        TimerMode::Focus => Color::Magenta,
        TimerMode::Break => Color::Green,
    };

    let header = Paragraph::new("Boost your concentration with the Pomodoro Technique.")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Focus Session"));
    f.render_widget(header, chunks[0]);

    let state = if timer.is_running() { "running" } else { "paused" };
    let clock = Paragraph::new(vec![
        Line::from(Span::styled(
            timer.mode().label().to_uppercase(),
            Style::default().fg(mode_color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            timer.format_clock(),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(state, Style::default().fg(Color::Gray))),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(clock, chunks[1]);

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Remaining"))
        .gauge_style(Style::default().fg(mode_color))
        .ratio(timer.progress().clamp(0.0, 1.0));
    f.render_widget(gauge, chunks[2]);

    let action = if timer.is_running() { "Pause Session" } else { "Start Session" };
    let focus_marker = if timer.mode() == TimerMode::Focus { ">" } else { " " };
    let break_marker = if timer.mode() == TimerMode::Break { ">" } else { " " };
    let help = format!(
        "{} Focus Mode: 25 minutes of deep concentration.\n{} Break Mode: 5 minutes of relaxation.\n\nControls:\n• Space/s: {}\n• r: Reset\n• m: Switch mode",
        focus_marker, break_marker, action
    );
    let help = Paragraph::new(help).block(Block::default().borders(Borders::ALL).title("Modes"));
    f.render_widget(help, chunks[3]);
}

fn render_form(f: &mut Frame, app: &mut App) {
    let Some(form) = &app.form else {
        return;
    };

    let popup_area = centered_rect(60, 60, f.area());
    let title = if form.is_editing() { "Edit Task" } else { "New Task" };
    let submit = if form.is_editing() { "Update Task" } else { "Add Task to Board" };

    let field_line = |field: FormField, value: String| -> Vec<Line<'static>> {
        let focused = form.focus == field;
        let label_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let cursor = if focused && field != FormField::Priority { "_" } else { "" };
        vec![
            Line::from(Span::styled(field.label(), label_style)),
            Line::from(format!("  {}{}", value, cursor)),
            Line::from(""),
        ]
    };

    let mut lines = Vec::new();
    lines.extend(field_line(FormField::Title, form.title.clone()));
    lines.extend(field_line(FormField::Description, form.description.clone()));
    lines.extend(field_line(FormField::DueDate, form.due_date.clone()));
    lines.extend(field_line(FormField::Priority, format!("< {} >", form.priority)));
    if let Some(error) = &form.error {
        lines.push(Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))));
    }
    lines.push(Line::from(format!("Enter: {} | Tab: Next field | ←/→: Priority | ESC: Cancel", submit)));

    let content = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::DarkGray).fg(Color::White)),
        );
    f.render_widget(Clear, popup_area);
    f.render_widget(content, popup_area);
}

fn render_chat(f: &mut Frame, app: &mut App) {
    let area = f.area();
    let width = (area.width / 2).max(30).min(area.width);
    let height = area.height.saturating_sub(4).max(10).min(area.height);
    let popup_area = Rect {
        x: area.width.saturating_sub(width),
        y: area.height.saturating_sub(height + 1),
        width,
        height,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)].as_ref())
        .split(popup_area);

    let mut lines: Vec<Line> = Vec::new();
    for msg in &app.chat_messages {
        let (who, color) = match msg.role {
            ChatRole::User => ("You", Color::Cyan),
            ChatRole::Assistant => ("TaskPilot AI", Color::Magenta),
        };
        lines.push(Line::from(Span::styled(
            format!("{}:", who),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        for text_line in msg.content.lines() {
            lines.push(Line::from(text_line.to_string()));
        }
        lines.push(Line::from(""));
    }
    if app.chat_state.is_pending() {
        lines.push(Line::from(Span::styled("Thinking...", Style::default().fg(Color::Gray))));
    }

    // Keep the newest messages in view
    let visible = chunks[0].height.saturating_sub(2) as usize;
    let skip = lines.len().saturating_sub(visible);
    let transcript = Paragraph::new(lines.into_iter().skip(skip).collect::<Vec<_>>())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("TaskPilot AI | ESC: Close")
                .borders(Borders::ALL)
                .style(Style::default().bg(Color::Black)),
        );

    let input_title = if app.chat_state.is_pending() { "Waiting for reply..." } else { "Ask anything... (Enter to send)" };
    let input = Paragraph::new(format!("{}_", app.chat_input))
        .block(Block::default().title(input_title).borders(Borders::ALL));

    f.render_widget(Clear, popup_area);
    f.render_widget(transcript, chunks[0]);
    f.render_widget(input, chunks[1]);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let text = if let Some(message) = &app.status_message {
        message.clone()
    } else {
        let help = match app.view() {
            View::Dashboard => "↑/↓: Navigate | Enter: Open | Space: Toggle | n: New | a: Ask AI | Tab: Views | q: Quit",
            View::AllTasks => "↑/↓: Navigate | Enter: Open | Space: Toggle | d: Delete | f: Filter | /: Search | n: New | q: Quit",
            View::Pomodoro => "Space: Start/Pause | r: Reset | m: Switch mode | Tab: Views | q: Quit",
            View::TaskDetail => "Esc: Back | Space: Toggle | e: Edit | d: Delete | i: AI advice | a: Ask AI | q: Quit",
        };
        help.to_string()
    };

    f.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::Gray)),
        area,
    );
}
