use std::io;
use std::time::{Duration, Instant};

use clap::Args;
use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, BorderType, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap,
};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::Runtime;
use crate::errors::CliError;
use crate::poem::{PoemMode, PoemView};
use crate::tui::handlers::async_ops::spawn_health_fetch;
use crate::tui::handlers::{dispatch, handle_event, handle_tui_msg};
use crate::tui::{ApiHealth, App, Illustration, Mode, Tab, TuiMsg};

#[derive(Debug, Args)]
pub struct TuiArgs {
    /// Start in this generation mode
    #[arg(long, value_enum, ignore_case = true)]
    pub mode: Option<PoemMode>,
}

struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self, CliError> {
        enable_raw_mode()
            .map_err(|e| CliError::Generic(format!("Failed to enable raw mode: {e}")))?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)
            .map_err(|e| CliError::Generic(format!("Failed to enter alternate screen: {e}")))?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, Show, LeaveAlternateScreen);
    }
}

pub async fn handle(runtime: &Runtime, args: TuiArgs) -> Result<(), CliError> {
    if runtime.output.json {
        return Err(CliError::Usage(
            "`--json` is not supported for `poemsmith tui`.".to_string(),
        ));
    }

    let api = runtime.api_client()?;
    let mut app = App::new(api.base_url().to_string(), runtime.resolved_mode(args.mode));
    tracing::info!(api_url = %app.api_url, mode = app.poem_mode.as_str(), "tui started");

    let guard = TerminalGuard::enter()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| CliError::Generic(format!("Failed to init terminal: {e}")))?;
    terminal
        .clear()
        .map_err(|e| CliError::Generic(format!("Failed to clear terminal: {e}")))?;

    let (tx, mut rx) = mpsc::unbounded_channel::<TuiMsg>();
    spawn_health_fetch(api.clone(), tx.clone());

    loop {
        update_spinner(&mut app);
        terminal
            .draw(|f| ui(f, &mut app))
            .map_err(|e| CliError::Generic(format!("Failed to draw: {e}")))?;

        if app.should_quit {
            break;
        }

        while let Ok(msg) = rx.try_recv() {
            if let Some(effect) = handle_tui_msg(&mut app, msg) {
                dispatch(&api, &tx, &mut app, effect);
            }
        }

        let busy = app.loading || app.archive.loading;
        let poll_ms = if busy { 50 } else { 120 };
        if crossterm::event::poll(Duration::from_millis(poll_ms))
            .map_err(|e| CliError::Generic(format!("Event poll failed: {e}")))?
        {
            let event = crossterm::event::read()
                .map_err(|e| CliError::Generic(format!("Event read failed: {e}")))?;
            if let Some(effect) = handle_event(&mut app, event) {
                dispatch(&api, &tx, &mut app, effect);
            }
        }
    }

    app.stop_illustration();
    terminal
        .show_cursor()
        .map_err(|e| CliError::Generic(format!("Failed to restore cursor: {e}")))?;
    drop(guard);
    tracing::info!("tui exited");
    Ok(())
}

fn ui(f: &mut Frame<'_>, app: &mut App) {
    let size = f.area();

    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // tabs
            Constraint::Min(1),    // body
            Constraint::Length(1), // status bar
        ])
        .split(size);

    render_tabs(f, app, layout[0]);
    match app.tab {
        Tab::Write => render_write_tab(f, app, layout[1]),
        Tab::Archive => render_archive_tab(f, app, layout[1]),
    }
    render_status_bar(f, app, layout[2]);

    match app.mode {
        Mode::ArchiveModal => {
            let area = centered_rect(80, 80, size);
            f.render_widget(Clear, area);
            f.render_widget(render_archive_modal(app), area);
        }
        Mode::Help => {
            let area = centered_rect(60, 60, size);
            f.render_widget(Clear, area);
            f.render_widget(render_help(), area);
        }
        Mode::Main => {}
    }
}

fn render_tabs(f: &mut Frame<'_>, app: &App, area: Rect) {
    let titles: Vec<Line<'static>> = Tab::ALL
        .iter()
        .map(|t| Line::from(format!(" {} ", t.title())))
        .collect();
    let mode_label = match app.poem_mode {
        PoemMode::Classic => Span::styled(" classic ", Style::default().fg(c_muted())),
        PoemMode::Eighties => Span::styled(
            " 1980s mode ",
            Style::default()
                .fg(Color::Black)
                .bg(c_neon())
                .add_modifier(Modifier::BOLD),
        ),
    };

    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .highlight_style(
            Style::default()
                .fg(c_brand())
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )
        .divider("|")
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(Line::from(vec![Span::styled(
                    " poemsmith ",
                    Style::default().fg(c_brand()).add_modifier(Modifier::BOLD),
                )]))
                .title(Line::from(vec![mode_label]).right_aligned()),
        );
    f.render_widget(tabs, area);
}

fn render_write_tab(f: &mut Frame<'_>, app: &App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(42), Constraint::Min(20)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(1)])
        .split(cols[0]);

    render_prompt_form(f, app, left[0]);
    f.render_widget(render_form_feedback(app), left[1]);
    f.render_widget(render_poem(app), cols[1]);
}

fn render_prompt_form(f: &mut Frame<'_>, app: &App, area: Rect) {
    let button = if app.loading {
        Span::styled(" Generating... ", Style::default().fg(c_muted()))
    } else if app.prompt().trim().is_empty() {
        Span::styled(" Write ", Style::default().fg(c_muted()).add_modifier(Modifier::DIM))
    } else {
        Span::styled(
            " Write (Enter) ",
            Style::default().fg(Color::Black).bg(c_brand()),
        )
    };

    let text = if app.input.is_empty() {
        Text::from(Line::from(Span::styled(
            "Enter your prompt...",
            Style::default().fg(c_muted()).add_modifier(Modifier::ITALIC),
        )))
    } else {
        Text::from(app.prompt())
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" Prompt ")
        .title_bottom(Line::from(button).right_aligned());
    let inner = block.inner(area);
    let form = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(form, area);

    if app.mode == Mode::Main && app.tab == Tab::Write && inner.width > 0 {
        let (row, col) = cursor_offset(&app.input[..app.cursor], inner.width as usize);
        let x = inner.x.saturating_add(col as u16);
        let y = inner.y.saturating_add(row as u16);
        if y < inner.y + inner.height {
            f.set_cursor_position((x.min(inner.x + inner.width - 1), y));
        }
    }
}

fn render_form_feedback(app: &App) -> Paragraph<'static> {
    let mut lines = Vec::new();
    if let Some(err) = &app.error {
        lines.push(Line::from(Span::styled(
            format!("Error: {err}"),
            Style::default().fg(c_error()).add_modifier(Modifier::BOLD),
        )));
    }
    if app.loading {
        lines.push(Line::from(vec![
            Span::styled(spinner_frame(app.spinner_step), Style::default().fg(c_brand())),
            Span::raw(" Generating your poem..."),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "F2 toggles 1980s mode. Ctrl+S shows similar poems.",
        Style::default().fg(c_muted()),
    )));

    Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::NONE))
        .wrap(Wrap { trim: false })
}

fn render_poem(app: &App) -> Paragraph<'static> {
    let lines = match &app.poem {
        Some(poem) => poem_display_lines(poem, &app.illustration, app.show_similar),
        None => vec![Line::from(Span::styled(
            "Your poem will appear here.",
            Style::default().fg(c_muted()).add_modifier(Modifier::ITALIC),
        ))],
    };

    let title = match &app.selected_archive_id {
        Some(id) => format!(" Poem (archive #{id}) "),
        None => " Poem ".to_string(),
    };
    Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(title),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0))
}

fn poem_display_lines(
    poem: &PoemView,
    illustration: &Illustration,
    show_similar: bool,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    if !poem.title.trim().is_empty() {
        lines.push(Line::from(Span::styled(
            poem.title.trim().to_string(),
            Style::default().fg(c_brand()).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
    }
    for line in poem.body.lines() {
        lines.push(Line::from(line.to_string()));
    }
    if !poem.signature.trim().is_empty() {
        lines.push(Line::from(""));
        for line in poem.signature.lines() {
            lines.push(Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(c_muted()).add_modifier(Modifier::ITALIC),
            )));
        }
    }

    if let Some(line) = illustration_line(illustration) {
        lines.push(Line::from(""));
        lines.push(line);
    }

    if show_similar && !poem.similar_poems.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Similar poems ({})", poem.similar_poems.len()),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for similar in &poem.similar_poems {
            lines.push(Line::from(""));
            for line in similar.lines() {
                lines.push(Line::from(Span::styled(
                    format!("  {line}"),
                    Style::default().fg(c_muted()),
                )));
            }
        }
    }
    lines
}

fn illustration_line(illustration: &Illustration) -> Option<Line<'static>> {
    match illustration {
        Illustration::None => None,
        Illustration::Pending { .. } => Some(Line::from(Span::styled(
            "Illustration: painting... (checking every 3s)",
            Style::default().fg(c_muted()),
        ))),
        Illustration::Ready { url: Some(url) } => Some(Line::from(vec![
            Span::styled("Illustration: ", Style::default().fg(c_ok())),
            Span::styled(
                url.clone(),
                Style::default().fg(c_ok()).add_modifier(Modifier::UNDERLINED),
            ),
            Span::styled("  (Ctrl+O to open)", Style::default().fg(c_muted())),
        ])),
        Illustration::Ready { url: None } => Some(Line::from(Span::styled(
            "Illustration: ready",
            Style::default().fg(c_ok()),
        ))),
        Illustration::Unavailable => Some(Line::from(Span::styled(
            "Illustration: unavailable",
            Style::default().fg(c_muted()).add_modifier(Modifier::DIM),
        ))),
    }
}

fn render_archive_tab(f: &mut Frame<'_>, app: &mut App, area: Rect) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title(" Archive (Up/Down, Enter read, r refresh) ");

    if app.archive.items.is_empty() {
        let message = if app.archive.loading {
            Span::styled(
                format!("{} Loading archive...", spinner_frame(app.spinner_step)),
                Style::default().fg(c_muted()),
            )
        } else if let Some(err) = &app.archive.error {
            Span::styled(format!("Error: {err}"), Style::default().fg(c_error()))
        } else {
            Span::styled("No poems yet.", Style::default().fg(c_muted()))
        };
        let empty = Paragraph::new(Line::from(message))
            .block(block)
            .wrap(Wrap { trim: false });
        f.render_widget(empty, cols[0]);
    } else {
        let list = render_archive_list(app, cols[0].width.saturating_sub(6) as usize).block(block);
        f.render_stateful_widget(list, cols[0], &mut app.archive.list_state);
    }

    f.render_widget(render_archive_preview(app), cols[1]);
}

fn render_archive_list(app: &App, width: usize) -> List<'static> {
    let items: Vec<ListItem<'static>> = app
        .archive
        .items
        .iter()
        .map(|poem| {
            let title = if poem.title.trim().is_empty() {
                "Untitled"
            } else {
                poem.title.trim()
            };
            let id = format!("#{} ", poem.id);
            let remaining = width.saturating_sub(id.width());
            ListItem::new(Line::from(vec![
                Span::styled(id, Style::default().fg(c_muted())),
                Span::raw(truncate_to_width(title, remaining)),
            ]))
        })
        .collect();

    List::new(items)
        .highlight_style(Style::default().fg(c_brand()).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ")
}

fn render_archive_preview(app: &App) -> Paragraph<'static> {
    let lines = match app.selected_archive_item() {
        Some(entry) => {
            let mut lines = vec![Line::from(Span::styled(
                entry.title.trim().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ))];
            lines.push(Line::from(""));
            lines.extend(
                entry
                    .content
                    .lines()
                    .take(12)
                    .map(|l| Line::from(l.to_string())),
            );
            if entry.content.lines().count() > 12 {
                lines.push(Line::from(Span::styled(
                    "... (Enter to read)",
                    Style::default().fg(c_muted()),
                )));
            }
            lines
        }
        None => vec![Line::from("")],
    };

    Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title(" Preview "),
        )
        .wrap(Wrap { trim: false })
}

fn render_archive_modal(app: &App) -> Paragraph<'static> {
    let lines = match &app.poem {
        Some(poem) => poem_display_lines(poem, &Illustration::None, false),
        None => vec![Line::from("")],
    };
    Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(c_brand()))
                .title(" Archived poem (Esc close, Tab open in Write, Up/Down scroll) "),
        )
        .wrap(Wrap { trim: false })
        .scroll((app.scroll, 0))
}

fn render_status_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    let (health_label, health_color) = match app.api_health {
        ApiHealth::Unknown => ("api: ?", c_muted()),
        ApiHealth::Online => ("api: online", c_ok()),
        ApiHealth::Offline => ("api: offline", c_error()),
    };
    let left = match app.illustration_poll.as_ref().filter(|poll| !poll.is_finished()) {
        Some(poll) => format!(" {}  [illustration #{}] ", app.api_url, poll.poem_id()),
        None => format!(" {}  ", app.api_url),
    };
    let status_width = (area.width as usize)
        .saturating_sub(left.width() + health_label.width() + 4);

    let bar = Paragraph::new(Line::from(vec![
        Span::styled(health_label, Style::default().fg(health_color)),
        Span::styled(left, Style::default().fg(c_muted())),
        Span::raw(truncate_to_width(&app.status, status_width)),
    ]))
    .style(Style::default().bg(Color::Rgb(30, 30, 40)).fg(Color::White));
    f.render_widget(bar, area);
}

fn render_help() -> Paragraph<'static> {
    let lines = vec![
        Line::from(vec![Span::styled(
            "poemsmith",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Enter: write a poem from the prompt"),
        Line::from("Tab: switch between Write and Archive"),
        Line::from("F2 / Ctrl+E: toggle 1980s mode"),
        Line::from("Ctrl+O: open the illustration in a browser"),
        Line::from("Ctrl+S: show similar poems"),
        Line::from("Ctrl+U: clear the prompt"),
        Line::from("PgUp/PgDn: scroll the poem"),
        Line::from("Archive: Up/Down select, Enter read, r refresh"),
        Line::from("Esc: close popup, or quit"),
    ];

    Paragraph::new(Text::from(lines))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .title("Help (Esc to close)"),
        )
        .wrap(Wrap { trim: false })
}

fn c_brand() -> Color {
    Color::Rgb(230, 170, 90)
}

fn c_neon() -> Color {
    Color::Rgb(255, 80, 200)
}

fn c_ok() -> Color {
    Color::Rgb(120, 220, 140)
}

fn c_error() -> Color {
    Color::Rgb(240, 100, 100)
}

fn c_muted() -> Color {
    Color::Rgb(140, 140, 160)
}

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn spinner_frame(step: u64) -> &'static str {
    SPINNER[(step % SPINNER.len() as u64) as usize]
}

fn update_spinner(app: &mut App) {
    if !(app.loading || app.archive.loading) {
        return;
    }
    if app.spinner_last.elapsed() >= Duration::from_millis(100) {
        app.spinner_step = app.spinner_step.wrapping_add(1);
        app.spinner_last = Instant::now();
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    let vertical = popup_layout[1];
    let popup_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical);

    popup_layout[1]
}

/// Row and column of the cursor after `before` when soft-wrapped at `width`.
fn cursor_offset(before: &[char], width: usize) -> (usize, usize) {
    let width = width.max(1);
    let mut row = 0usize;
    let mut col = 0usize;
    for ch in before {
        let cw = UnicodeWidthChar::width(*ch).unwrap_or(0);
        if col + cw > width {
            row += 1;
            col = 0;
        }
        col += cw;
    }
    if col >= width {
        row += 1;
        col = 0;
    }
    (row, col)
}

fn truncate_to_width(input: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if input.width() <= max_width {
        return input.to_string();
    }

    const ELLIPSIS: &str = "…";
    let ell_w = ELLIPSIS.width();
    if max_width <= ell_w {
        return ELLIPSIS.to_string();
    }

    let mut out = String::new();
    let mut w = 0usize;
    for ch in input.chars() {
        let cw = UnicodeWidthChar::width(ch).unwrap_or(0);
        if w + cw + ell_w > max_width {
            break;
        }
        out.push(ch);
        w += cw;
    }
    out.push_str(ELLIPSIS);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_titles() {
        assert_eq!(truncate_to_width("Ode", 10), "Ode");
        assert_eq!(truncate_to_width("Happiness is warm Zapper", 10), "Happiness…");
        assert_eq!(truncate_to_width("anything", 0), "");
    }

    #[test]
    fn cursor_wraps_at_width() {
        let text: Vec<char> = "abcdef".chars().collect();
        assert_eq!(cursor_offset(&text[..3], 4), (0, 3));
        assert_eq!(cursor_offset(&text[..4], 4), (1, 0));
        assert_eq!(cursor_offset(&text[..6], 4), (1, 2));
    }

    #[test]
    fn poem_lines_include_illustration_state() {
        let poem = PoemView {
            title: "Ode".to_string(),
            body: "a\nb".to_string(),
            signature: "(sig)".to_string(),
            similar_poems: vec!["other".to_string()],
            poem_id: Some("1".to_string()),
        };
        let plain = poem_display_lines(&poem, &Illustration::None, false);
        assert_eq!(plain.len(), 6);

        let pending = poem_display_lines(
            &poem,
            &Illustration::Pending {
                poem_id: "1".to_string(),
            },
            true,
        );
        // blank + illustration, blank + heading, blank + one similar line
        assert_eq!(pending.len(), 12);
    }
}
