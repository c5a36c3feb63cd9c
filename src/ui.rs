use anyhow::Result;
use campus_compass::compare::ComparisonSet;
use campus_compass::discovery::{Answer, DiscoveryWizard, Phase, Recommendation, StepKind};
use campus_compass::{
    Catalog, CatalogFilter, College, FixedRecommendations, Highlight, Overlay, Page,
    QueryOutcome, QueryService, RequestToken, ResultsSlot, Served, ViewState,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::debug;

/// Rating thresholds cycled by the `r` key
const RATING_STEPS: [f32; 2] = [4.0, 4.5];
const RANGE_STEP: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Location,
}

pub struct App {
    pub catalog: Catalog,
    service: Arc<QueryService>,
    runtime: Handle,
    completions: mpsc::UnboundedReceiver<(RequestToken, QueryOutcome)>,
    sender: mpsc::UnboundedSender<(RequestToken, QueryOutcome)>,

    pub results: ResultsSlot,
    pub state: TableState,
    pub view: ViewState,
    pub input_mode: InputMode,
    pub input: String,
    pub filter: CatalogFilter,
    pub last_search: Option<String>,

    pub comparison: ComparisonSet,
    pub wizard: DiscoveryWizard,
    pub quiz_cursor: usize,
    pub recommendations: Vec<Recommendation>,

    pub status: Option<String>,
}

impl App {
    pub fn new(service: Arc<QueryService>, runtime: Handle, compare_max: usize) -> Self {
        let catalog = service.last_known_good();
        let (sender, completions) = mpsc::unbounded_channel();
        let comparison = ComparisonSet::with_defaults(&catalog, compare_max);

        let mut app = Self {
            catalog,
            service,
            runtime,
            completions,
            sender,
            results: ResultsSlot::new(),
            state: TableState::default(),
            view: ViewState::new(),
            input_mode: InputMode::Normal,
            input: String::new(),
            filter: CatalogFilter::new(),
            last_search: None,
            comparison,
            wizard: DiscoveryWizard::new(),
            quiz_cursor: 0,
            recommendations: Vec::new(),
            status: None,
        };
        app.back_to_list();
        app.refresh();
        app
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// Re-run the catalog fetch with the current filter
    pub fn refresh(&mut self) {
        self.last_search = None;
        let token = self.results.begin();
        let service = self.service.clone();
        let sender = self.sender.clone();
        let filter = self.filter.clone();

        self.runtime.spawn(async move {
            let outcome = service.fetch_catalog(&filter).await;
            let _ = sender.send((token, outcome));
        });
    }

    pub fn search(&mut self, query: String) {
        let token = self.results.begin();
        let service = self.service.clone();
        let sender = self.sender.clone();
        self.last_search = Some(query.clone());

        self.runtime.spawn(async move {
            let outcome = service.search_catalog(&query).await;
            let _ = sender.send((token, outcome));
        });
    }

    /// Apply finished queries; stale ones are dropped by the slot
    pub fn drain_completions(&mut self) {
        while let Ok((token, outcome)) = self.completions.try_recv() {
            if self.results.complete(token, outcome) {
                let len = self.results.current().len();
                self.state.select(if len == 0 { None } else { Some(0) });
                if self.results.served() == Some(Served::Fallback) {
                    self.status = Some("Catalog source unavailable, showing saved results".to_string());
                }
            }
        }
    }

    pub fn selected_college(&self) -> Option<&College> {
        self.state
            .selected()
            .and_then(|i| self.results.current().get(i))
    }

    // ========================================================================
    // FILTERS
    // ========================================================================

    pub fn cycle_type_filter(&mut self) {
        let types = self.catalog.types();
        let next = match &self.filter.college_type {
            None => types.first().map(|t| t.to_string()),
            Some(current) => types
                .iter()
                .position(|t| *t == current.as_str())
                .and_then(|i| types.get(i + 1))
                .map(|t| t.to_string()),
        };
        self.filter.college_type = next;
        self.refresh();
    }

    pub fn cycle_rating_filter(&mut self) {
        self.filter.rating = match self.filter.rating {
            None => Some(RATING_STEPS[0]),
            Some(r) => RATING_STEPS.iter().copied().find(|step| *step > r),
        };
        self.refresh();
    }

    pub fn clear_filter(&mut self) {
        self.filter = CatalogFilter::new();
        self.refresh();
    }

    pub fn next(&mut self) {
        let len = self.results.current().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.results.current().len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    // ========================================================================
    // KEYS
    // ========================================================================

    /// Returns true when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.input_mode != InputMode::Normal {
            self.handle_input_key(key);
            return false;
        }

        match self.view.overlay().clone() {
            Overlay::Discovery => {
                self.handle_discovery_key(key);
                return false;
            }
            Overlay::None => {}
            _ => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
                    self.view.close_overlay();
                } else if key.code == KeyCode::Char('x') {
                    self.remove_last_compared();
                }
                return false;
            }
        }

        self.status = None;
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Esc => {
                if self.view.selected_college().is_some() {
                    self.back_to_list();
                } else {
                    return true;
                }
            }
            KeyCode::Enter => self.toggle_detail(),
            KeyCode::Char('/') => self.start_input(InputMode::Search),
            KeyCode::Char('o') => self.start_input(InputMode::Location),
            KeyCode::Char('t') => self.cycle_type_filter(),
            KeyCode::Char('r') => self.cycle_rating_filter(),
            KeyCode::Char('c') => self.clear_filter(),
            KeyCode::Char('a') => self.add_selected_to_comparison(),
            KeyCode::Char('v') => self.open(Overlay::Comparison),
            KeyCode::Char('d') => self.open_discovery(),
            KeyCode::Char('l') => self.toggle_session(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => self.state.select(Some(0)),
            KeyCode::End => {
                let len = self.results.current().len();
                if len > 0 {
                    self.state.select(Some(len - 1));
                }
            }
            _ => {}
        }
        false
    }

    fn start_input(&mut self, mode: InputMode) {
        self.input_mode = mode;
        self.input = match mode {
            InputMode::Search => self.last_search.clone().unwrap_or_default(),
            InputMode::Location => self.filter.location.clone().unwrap_or_default(),
            InputMode::Normal => String::new(),
        };
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(ch) => self.input.push(ch),
            KeyCode::Enter => {
                let text = std::mem::take(&mut self.input);
                match self.input_mode {
                    InputMode::Search => self.search(text),
                    InputMode::Location => {
                        self.filter.location = Some(text).filter(|t| !t.trim().is_empty());
                        self.refresh();
                    }
                    InputMode::Normal => {}
                }
                self.input_mode = InputMode::Normal;
            }
            _ => {}
        }
    }

    fn back_to_list(&mut self) {
        if let Err(e) = self.view.navigate(Page::Colleges) {
            self.status = Some(e.to_string());
        }
    }

    fn toggle_detail(&mut self) {
        if self.view.selected_college().is_some() {
            self.back_to_list();
            return;
        }
        if let Some(id) = self.selected_college().map(|c| c.id.clone()) {
            if let Err(e) = self.view.open_college(&id, &self.catalog) {
                self.status = Some(e.to_string());
            }
        }
    }

    fn open(&mut self, overlay: Overlay) {
        if let Err(e) = self.view.open_overlay(overlay) {
            self.status = Some(e.to_string());
        }
    }

    fn toggle_session(&mut self) {
        if self.view.is_signed_in() {
            self.view.sign_out();
            self.status = Some("Signed out".to_string());
        } else {
            self.view.sign_in();
            self.status = Some("Signed in".to_string());
        }
    }

    fn add_selected_to_comparison(&mut self) {
        let college = match self.selected_college() {
            Some(c) => c.clone(),
            None => return,
        };
        self.status = Some(match self.comparison.add(&college) {
            Ok(()) => format!("Added {} to comparison", college.name),
            Err(e) => e.to_string(),
        });
    }

    fn remove_last_compared(&mut self) {
        if let Some(id) = self.comparison.selected().last().map(|c| c.id.clone()) {
            if let Err(e) = self.comparison.remove(&id) {
                self.status = Some(e.to_string());
            }
        }
    }

    fn open_discovery(&mut self) {
        self.wizard = DiscoveryWizard::new();
        self.recommendations.clear();
        self.quiz_cursor = 0;
        self.open(Overlay::Discovery);
    }

    fn handle_discovery_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc {
            self.view.close_overlay();
            return;
        }

        if self.wizard.phase() == Phase::Results {
            let pick = match key.code {
                KeyCode::Char(ch) => ch.to_digit(10).map(|d| d as usize),
                _ => None,
            };
            if let Some(rec) = pick.and_then(|n| n.checked_sub(1)).and_then(|i| self.recommendations.get(i)) {
                if let Err(e) = self.view.select_recommendation(rec, &self.catalog) {
                    self.status = Some(e.to_string());
                }
            }
            return;
        }

        let step = match self.wizard.current_step() {
            Some(step) => step,
            None => return,
        };

        let outcome = match (key.code, step.kind) {
            (KeyCode::Down | KeyCode::Char('j'), _) => {
                if !step.options.is_empty() {
                    self.quiz_cursor = (self.quiz_cursor + 1) % step.options.len();
                }
                Ok(())
            }
            (KeyCode::Up | KeyCode::Char('k'), _) => {
                if !step.options.is_empty() {
                    self.quiz_cursor = (self.quiz_cursor + step.options.len() - 1) % step.options.len();
                }
                Ok(())
            }
            (KeyCode::Char(' '), StepKind::Single) => self
                .wizard
                .answer(step.id, Answer::Single(step.options[self.quiz_cursor].to_string())),
            (KeyCode::Char(' '), StepKind::Multiple) => {
                self.wizard.toggle_option(step.options[self.quiz_cursor])
            }
            (KeyCode::Left | KeyCode::Right, StepKind::Range { min, max, default, .. }) => {
                let current = match self.wizard.answer_for(step.id) {
                    Some(Answer::Range(v)) => *v,
                    _ => default,
                };
                let value = if key.code == KeyCode::Left {
                    current.saturating_sub(RANGE_STEP).max(min)
                } else {
                    current.saturating_add(RANGE_STEP).min(max)
                };
                self.wizard.answer(step.id, Answer::Range(value))
            }
            (KeyCode::Backspace, _) => {
                self.wizard.previous();
                self.quiz_cursor = 0;
                Ok(())
            }
            (KeyCode::Enter, _) => self.advance_quiz(),
            _ => Ok(()),
        };

        if let Err(e) = outcome {
            self.status = Some(e.to_string());
        }
    }

    fn advance_quiz(&mut self) -> Result<(), campus_compass::DiscoveryError> {
        let phase = self.wizard.next()?;
        self.quiz_cursor = 0;
        if phase == Phase::Analyzing {
            self.recommendations = self.wizard.finish(&FixedRecommendations, &self.catalog)?;
            debug!(count = self.recommendations.len(), "Discovery finished");
        }
        Ok(())
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        app.drain_completions();
        terminal.draw(|f| ui(f, app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if app.handle_key(key) {
                    return Ok(());
                }
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.view.overlay() {
        Overlay::Comparison => render_comparison(f, chunks[1], app),
        Overlay::Discovery => render_discovery(f, chunks[1], app),
        _ => {
            if app.view.selected_college().is_some() {
                let content_chunks = Layout::default()
                    .direction(Direction::Horizontal)
                    .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                    .split(chunks[1]);

                render_table(f, content_chunks[0], app);
                render_detail_panel(f, content_chunks[1], app);
            } else {
                render_table(f, chunks[1], app);
            }
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let active = match app.view.overlay() {
        Overlay::Comparison => 1,
        Overlay::Discovery => 2,
        _ => 0,
    };

    let mut spans = vec![];
    for (i, name) in ["Colleges", "Compare", "Discover"].iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" │ "));
        }
        let style = if i == active {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(*name, style));
    }

    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Catalog: {}", app.catalog.len()),
        Style::default().fg(Color::White),
    ));
    spans.push(Span::raw("  |  "));
    spans.push(Span::styled(
        format!("Comparing {}/{}", app.comparison.selected().len(), app.comparison.max()),
        Style::default().fg(Color::Cyan),
    ));
    spans.push(Span::raw("  |  "));
    spans.push(if app.view.is_signed_in() {
        Span::styled("Signed in", Style::default().fg(Color::Green))
    } else {
        Span::styled("Guest", Style::default().fg(Color::DarkGray))
    });

    let header = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn rating_color(rating: f32) -> Color {
    if rating >= 4.5 {
        Color::Green
    } else if rating >= 4.0 {
        Color::Yellow
    } else {
        Color::White
    }
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Name", "Type", "Location", "Rating", "NIRF", "Placement"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.results.current().iter().map(|c| {
        let marker = if app.comparison.contains(&c.id) { "◆ " } else { "" };
        Row::new(vec![
            Cell::from(format!("{}{}", marker, truncate(&c.name, 40))),
            Cell::from(truncate(&c.college_type, 20)),
            Cell::from(truncate(&c.location, 22)),
            Cell::from(format!("{:.1}", c.rating)).style(Style::default().fg(rating_color(c.rating))),
            Cell::from(c.rankings.nirf.to_string()),
            Cell::from(format!("{}%", c.placement_rate)),
        ])
        .height(1)
    });

    let title = if app.results.is_loading() {
        " Colleges (loading...) ".to_string()
    } else {
        format!(" Colleges ({}) ", app.results.current().len())
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(44),
            Constraint::Length(22),
            Constraint::Length(24),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn label(name: &str) -> Span<'static> {
    Span::styled(
        format!("  {}: ", name),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )
}

fn section(name: &str) -> Line<'static> {
    Line::from(Span::styled(
        format!("  {}", name),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    ))
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let college = match app
        .view
        .selected_college()
        .and_then(|id| app.catalog.find_by_id(id))
    {
        Some(c) => c,
        None => {
            let empty = Paragraph::new("No college selected").block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow))
                    .title(" College Details "),
            );
            f.render_widget(empty, area);
            return;
        }
    };

    let mut content = vec![
        Line::from(Span::styled(
            format!("  {}", college.name),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![label("Type"), Span::raw(college.college_type.clone())]),
        Line::from(vec![label("Location"), Span::raw(college.location.clone())]),
        Line::from(vec![label("Established"), Span::raw(college.established_label())]),
        Line::from(vec![
            label("Rating"),
            Span::styled(
                format!("{:.1}", college.rating),
                Style::default().fg(rating_color(college.rating)),
            ),
            Span::raw(format!(" ({} reviews)", college.review_count)),
        ]),
        Line::from(vec![
            label("Students"),
            Span::raw(college.students_count.to_string()),
            Span::raw("   "),
            label("Courses"),
            Span::raw(college.courses_count.to_string()),
        ]),
        Line::from(vec![
            label("NIRF"),
            Span::raw(college.rankings.nirf.to_string()),
            Span::raw("   "),
            label("QS"),
            Span::raw(college.rankings.qs.to_string()),
        ]),
        Line::from(vec![label("Campus"), Span::raw(college.campus_size.clone())]),
        Line::from(""),
        section("PLACEMENTS"),
        Line::from(vec![
            label("Placement Rate"),
            Span::styled(
                format!("{}%", college.placement_rate),
                Style::default().fg(Color::Green),
            ),
        ]),
        Line::from(vec![label("Avg Package"), Span::raw(college.avg_package.clone())]),
    ];

    if let Some(stats) = &college.placement_stats {
        content.push(Line::from(vec![
            label("Placed"),
            Span::raw(format!("{} / {}", stats.placed_students, stats.total_students)),
        ]));
    }
    if !college.top_recruiters.is_empty() {
        content.push(Line::from(vec![
            label("Recruiters"),
            Span::raw(college.recruiter_preview(6).join(", ")),
        ]));
    }

    content.push(Line::from(""));
    content.push(section("FEES"));
    content.push(Line::from(vec![
        label("Tuition"),
        Span::raw(college.fees.tuition.clone()),
        Span::raw("   "),
        label("Hostel"),
        Span::raw(college.fees.hostel.clone()),
    ]));

    if !college.branch_cutoffs.is_empty() {
        content.push(Line::from(""));
        content.push(section("CUTOFFS"));
        for cutoff in &college.branch_cutoffs {
            content.push(Line::from(vec![label(&cutoff.branch), Span::raw(cutoff.rank.clone())]));
        }
    }

    if !college.best_feature.is_empty() {
        content.push(Line::from(""));
        content.push(Line::from(vec![
            label("Best Feature"),
            Span::styled(college.best_feature.clone(), Style::default().fg(Color::Magenta)),
        ]));
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        format!("  {}", college.description),
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
    )));

    let panel = Paragraph::new(content)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" College Details "),
        );

    f.render_widget(panel, area);
}

fn highlight_style(highlight: Highlight) -> Style {
    match highlight {
        Highlight::Best => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        Highlight::Worst => Style::default().fg(Color::Red),
        Highlight::Neutral => Style::default().fg(Color::White),
    }
}

fn render_comparison(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.comparison.selected();
    let table = app.comparison.table();

    let mut header_cells = vec![Cell::from("Criteria").style(
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )];
    header_cells.extend(selected.iter().map(|c| {
        Cell::from(truncate(&c.name, 30)).style(
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )
    }));
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = table.rows.iter().map(|row| {
        let mut cells = vec![Cell::from(row.label.clone()).style(Style::default().fg(Color::Cyan))];
        cells.extend(
            row.cells
                .iter()
                .map(|cell| Cell::from(cell.display.clone()).style(highlight_style(cell.highlight))),
        );
        Row::new(cells).height(1)
    });

    let mut widths = vec![Constraint::Length(24)];
    widths.extend(selected.iter().map(|_| Constraint::Length(32)));

    let widget = Table::new(rows, widths).header(header).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Compare Colleges (a add from list, x remove last, Esc close) "),
    );

    f.render_widget(widget, area);
}

fn render_discovery(f: &mut Frame, area: Rect, app: &App) {
    let mut content = vec![Line::from("")];

    match app.wizard.phase() {
        Phase::InProgress { .. } => {
            let (current, total) = app.wizard.progress();
            content.push(Line::from(Span::styled(
                format!("  Step {} of {}", current, total),
                Style::default().fg(Color::DarkGray),
            )));
            content.push(Line::from(""));

            if let Some(step) = app.wizard.current_step() {
                content.push(Line::from(Span::styled(
                    format!("  {}", step.question),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                content.push(Line::from(""));

                match step.kind {
                    StepKind::Range { min, max, default, unit } => {
                        let value = match app.wizard.answer_for(step.id) {
                            Some(Answer::Range(v)) => *v,
                            _ => default,
                        };
                        content.push(Line::from(vec![
                            Span::raw(format!("  {} ◀ ", min)),
                            Span::styled(
                                format!("{} {}", value, unit),
                                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                            ),
                            Span::raw(format!(" ▶ {}", max)),
                        ]));
                    }
                    _ => {
                        for (i, option) in step.options.iter().enumerate() {
                            let chosen = match app.wizard.answer_for(step.id) {
                                Some(Answer::Single(v)) => v == option,
                                Some(Answer::Multiple(v)) => v.iter().any(|o| o == option),
                                _ => false,
                            };
                            let cursor = if i == app.quiz_cursor { "→" } else { " " };
                            let mark = if chosen { "[x]" } else { "[ ]" };
                            content.push(Line::from(Span::styled(
                                format!("  {} {} {}", cursor, mark, option),
                                if chosen {
                                    Style::default().fg(Color::Green)
                                } else {
                                    Style::default().fg(Color::White)
                                },
                            )));
                        }
                    }
                }
            }

            content.push(Line::from(""));
            content.push(Line::from(Span::styled(
                "  Space select | ←/→ adjust | Enter next | Backspace back | Esc close",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
        Phase::Analyzing => {
            content.push(Line::from("  Analyzing your preferences..."));
        }
        Phase::Results => {
            content.push(Line::from(Span::styled(
                "  Your Top Matches",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )));
            content.push(Line::from(""));
            for (i, rec) in app.recommendations.iter().enumerate() {
                content.push(Line::from(vec![
                    Span::styled(format!("  {}. ", i + 1), Style::default().fg(Color::Yellow)),
                    Span::styled(rec.name.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    Span::raw(format!("  {}% match", rec.match_score)),
                    Span::raw(format!("  trust {} ({})", rec.trust_score, rec.trust_level().as_str())),
                ]));
                content.push(Line::from(format!(
                    "     {} | {} | fees {} | rating {:.1}",
                    rec.location, rec.avg_package, rec.fees, rec.rating
                )));
                content.push(Line::from(Span::styled(
                    format!("     {}", rec.reasons.join(" · ")),
                    Style::default().fg(Color::DarkGray),
                )));
            }
            content.push(Line::from(""));
            content.push(Line::from(Span::styled(
                "  Press 1-3 to open a college, Esc to close",
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }
    }

    let paragraph = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Smart Discovery "),
    );

    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = vec![];

    match app.input_mode {
        InputMode::Search | InputMode::Location => {
            let prompt = if app.input_mode == InputMode::Search { " Search: " } else { " Location: " };
            spans.push(Span::styled(prompt, Style::default().fg(Color::Yellow)));
            spans.push(Span::raw(app.input.clone()));
            spans.push(Span::styled("█", Style::default().fg(Color::Yellow)));
        }
        InputMode::Normal => {
            let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);
            spans.push(Span::styled(
                format!(" Row: {}/{} ", selected, app.results.current().len()),
                Style::default().fg(Color::Cyan),
            ));

            let mut active = vec![];
            if let Some(t) = &app.filter.college_type {
                active.push(format!("type={}", t));
            }
            if let Some(l) = &app.filter.location {
                active.push(format!("location={}", l));
            }
            if let Some(r) = app.filter.rating {
                active.push(format!("rating>={}", r));
            }
            if let Some(q) = &app.last_search {
                active.push(format!("search=\"{}\"", q));
            }
            if !active.is_empty() {
                spans.push(Span::raw(" | "));
                spans.push(Span::styled(active.join(" "), Style::default().fg(Color::Green)));
            }

            if let Some(msg) = &app.status {
                spans.push(Span::raw(" | "));
                spans.push(Span::styled(msg.clone(), Style::default().fg(Color::Magenta)));
            }

            for (key, action) in [
                ("/", "Search"),
                ("t/o/r", "Filter"),
                ("c", "Clear"),
                ("a", "Compare+"),
                ("v", "Compare"),
                ("d", "Discover"),
                ("l", "Sign in/out"),
            ] {
                spans.push(Span::raw(" | "));
                spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
                spans.push(Span::raw(format!(" {}", action)));
            }
            spans.push(Span::raw(" | "));
            spans.push(Span::styled("q", Style::default().fg(Color::Red)));
            spans.push(Span::raw(" Quit"));
        }
    }

    let status_bar = Paragraph::new(vec![Line::from(spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_compass::Config;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        let config = Config::instant();
        let service = Arc::new(QueryService::embedded(&config).unwrap());
        App::new(service, Handle::current(), config.compare_max)
    }

    async fn settle(app: &mut App) {
        for _ in 0..50 {
            app.drain_completions();
            if !app.results.is_loading() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_initial_fetch_fills_table() {
        let mut app = app();
        settle(&mut app).await;
        assert_eq!(app.results.current().len(), 15);
        assert_eq!(app.state.selected(), Some(0));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_search_input_runs_query() {
        let mut app = app();
        settle(&mut app).await;

        app.handle_key(key(KeyCode::Char('/')));
        for ch in "delhi".chars() {
            app.handle_key(key(KeyCode::Char(ch)));
        }
        app.handle_key(key(KeyCode::Enter));
        settle(&mut app).await;

        assert_eq!(app.input_mode, InputMode::Normal);
        assert!(app
            .results
            .current()
            .iter()
            .all(|c| c.matches_text("delhi")));
        assert!(!app.results.current().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_type_filter_cycles_through_types() {
        let mut app = app();
        settle(&mut app).await;

        app.handle_key(key(KeyCode::Char('t')));
        settle(&mut app).await;
        assert_eq!(app.filter.college_type.as_deref(), Some("Engineering"));
        assert_eq!(app.results.current().len(), 8);

        app.handle_key(key(KeyCode::Char('c')));
        settle(&mut app).await;
        assert!(app.filter.is_empty());
        assert_eq!(app.results.current().len(), 15);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_comparison_needs_sign_in() {
        let mut app = app();
        settle(&mut app).await;

        app.handle_key(key(KeyCode::Char('v')));
        assert_eq!(app.view.overlay(), &Overlay::None);
        assert!(app.status.is_some());

        app.handle_key(key(KeyCode::Char('l')));
        app.handle_key(key(KeyCode::Char('v')));
        assert_eq!(app.view.overlay(), &Overlay::Comparison);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_enter_opens_detail() {
        let mut app = app();
        settle(&mut app).await;

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.view.selected_college(), Some("1"));
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.view.page(), &Page::Colleges);
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("₹₹₹₹₹₹", 5), "₹₹...");
        assert_eq!(truncate("short", 10), "short");
    }
}
