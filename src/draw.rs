use tui::backend::Backend;
use tui::layout::{Alignment, Constraint, Layout, Rect};
use tui::style::{Color, Modifier, Style};
use tui::text::{Line, Span};
use tui::widgets::{Block, BorderType, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, Tabs};
use tui::{Frame, Terminal};
use tui_logger::TuiLoggerWidget;

use crate::app::{App, MenuItem};
use crate::state::app_state::{PLAYER_SLOTS, SCORE_FIELDS};
use crate::state::network::{ERROR_CHAR, LoadingState, RECENT_GAMES};
use crate::ui::layout::LayoutAreas;
use foosball_api::Game;

static TABS: &[&str; 3] = &["Rankings", "Games", "Players"];

const HELP_LINES: &[&str] = &[
    "1  Rankings    2  Games    3  Players    ?  Help (Esc to leave)",
    "",
    "Games:    j/k or Tab  move between fields",
    "          h/l or -/+  change player or score",
    "          Enter       record the game",
    "",
    "Players:  j/k         select",
    "          a           add a player (Enter to save, Esc to cancel)",
    "          d           remove the selected player",
    "",
    "u  reload from the store    R  reset database    f  full screen",
    "\"  toggle logs              q  quit",
];

pub fn draw<B>(terminal: &mut Terminal<B>, app: &mut App, loading: LoadingState)
where
    B: Backend,
{
    let current_size = terminal.size().unwrap_or_default();
    if current_size.width <= 10 || current_size.height <= 10 {
        return;
    }

    let mut layout = LayoutAreas::new(current_size);

    let _ = terminal.draw(|f| {
        let area = f.area();
        layout.update(area, app.settings.full_screen, app.state.show_logs);

        if !app.settings.full_screen {
            draw_tabs(f, layout.tab_bar, app);
        }

        match app.state.active_tab {
            MenuItem::Rankings => draw_rankings(f, layout.main, app),
            MenuItem::Games => draw_games(f, layout.main, app),
            MenuItem::Players => draw_players(f, layout.main, app),
            MenuItem::Help => draw_help(f, layout.main),
        }

        if let Some(logs) = layout.logs {
            draw_logs(f, logs);
        }
        draw_status(f, layout.status, app);

        if app.state.confirm_reset {
            draw_reset_confirm(f, layout.main);
        }

        draw_loading_spinner(f, area, app, loading);
    });
}

pub fn default_border<'a>(color: Color) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
}

fn draw_tabs(f: &mut Frame, tab_bar: [Rect; 2], app: &App) {
    let style = Style::default().fg(Color::White);
    let border_type = BorderType::Rounded;

    let tab_index = match app.state.active_tab {
        MenuItem::Rankings => 0,
        MenuItem::Games => 1,
        MenuItem::Players => 2,
        MenuItem::Help => 0,
    };

    let titles: Vec<Line> = TABS.iter().map(|t| Line::from(*t)).collect();
    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .highlight_style(Style::default().add_modifier(Modifier::UNDERLINED))
        .select(tab_index)
        .style(style);
    f.render_widget(tabs, tab_bar[0]);

    let help = Paragraph::new(format!("{}  Help: ? ", app.settings.store_label()))
        .alignment(Alignment::Right)
        .block(
            Block::default()
                .borders(Borders::RIGHT | Borders::BOTTOM | Borders::TOP)
                .border_type(border_type),
        )
        .style(style);
    f.render_widget(help, tab_bar[1]);
}

fn draw_placeholder(f: &mut Frame, area: Rect, msg: &str) {
    f.render_widget(
        Paragraph::new(msg.to_string())
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center),
        area,
    );
}

fn header_row<'a>(titles: &[&'a str]) -> Row<'a> {
    Row::new(titles.iter().map(|t| Cell::from(*t)))
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
}

fn draw_rankings(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Player Rankings ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let league = &app.state.league;
    if !league.loaded {
        draw_placeholder(f, inner, "Loading league data...");
        return;
    }
    if league.rankings.is_empty() {
        draw_placeholder(f, inner, "No games recorded yet");
        return;
    }

    let rows = league.rankings.iter().enumerate().map(|(idx, entry)| {
        let s = &entry.stats;
        let style = match idx {
            0 => Style::default().fg(Color::Yellow),
            _ => Style::default(),
        };
        Row::new(vec![
            Cell::from(format!("{}", idx + 1)),
            Cell::from(entry.player.clone()),
            Cell::from(s.games.to_string()),
            Cell::from(s.wins.to_string()),
            Cell::from(s.losses.to_string()),
            Cell::from(s.draws.to_string()),
            Cell::from(format!("{:.1}%", s.win_rate)),
            Cell::from(s.points.to_string()),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Length(3),
        Constraint::Fill(1),
        Constraint::Length(7),
        Constraint::Length(6),
        Constraint::Length(8),
        Constraint::Length(7),
        Constraint::Length(9),
        Constraint::Length(7),
    ];
    let table = Table::new(rows, widths)
        .header(header_row(&["#", "Player", "Games", "Wins", "Losses", "Draws", "Win Rate", "Points"]))
        .column_spacing(1);
    f.render_widget(table, inner);
}

fn draw_games(f: &mut Frame, area: Rect, app: &App) {
    let [recent_area, form_area] = if area.width >= 100 {
        Layout::horizontal([Constraint::Fill(1), Constraint::Length(44)]).areas(area)
    } else {
        Layout::vertical([Constraint::Fill(1), Constraint::Length(10)]).areas(area)
    };
    draw_recent_games(f, recent_area, app);
    draw_game_form(f, form_area, app);
}

fn draw_recent_games(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(format!(" Recent Games (last {RECENT_GAMES}) "));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let league = &app.state.league;
    if !league.loaded {
        draw_placeholder(f, inner, "Loading league data...");
        return;
    }
    if league.recent_games.is_empty() {
        draw_placeholder(f, inner, "No games recorded yet");
        return;
    }

    let rows = league.recent_games.iter().map(recent_game_row);
    let widths = [
        Constraint::Length(16),
        Constraint::Fill(1),
        Constraint::Length(7),
        Constraint::Fill(1),
    ];
    let table = Table::new(rows, widths)
        .header(header_row(&["Date", "Team 1", "Score", "Team 2"]))
        .column_spacing(2);
    f.render_widget(table, inner);
}

fn recent_game_row(game: &Game) -> Row<'static> {
    let winner = Style::default().fg(Color::Green);
    let (team1_style, team2_style) = match game.team1_score.cmp(&game.team2_score) {
        std::cmp::Ordering::Greater => (winner, Style::default()),
        std::cmp::Ordering::Less => (Style::default(), winner),
        std::cmp::Ordering::Equal => (Style::default(), Style::default()),
    };
    Row::new(vec![
        Cell::from(game.date.format("%Y-%m-%d %H:%M").to_string()),
        Cell::from(game.team1.label()).style(team1_style),
        Cell::from(format!("{} - {}", game.team1_score, game.team2_score)),
        Cell::from(game.team2.label()).style(team2_style),
    ])
}

fn draw_game_form(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Add New Game ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let form = &app.state.game_form;
    let focused = |idx: usize| {
        if form.focus == idx {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default()
        }
    };

    let mut lines = Vec::with_capacity(PLAYER_SLOTS.len() + SCORE_FIELDS.len() + 2);
    for (idx, label) in PLAYER_SLOTS.iter().enumerate() {
        let value = form.picks[idx].as_deref().unwrap_or("(no player available)");
        lines.push(Line::from(vec![
            Span::styled(format!("{label:<16}"), Style::default().fg(Color::Gray)),
            Span::styled(format!("< {value} >"), focused(idx)),
        ]));
    }
    for (idx, label) in SCORE_FIELDS.iter().enumerate() {
        let field = PLAYER_SLOTS.len() + idx;
        lines.push(Line::from(vec![
            Span::styled(format!("{label:<16}"), Style::default().fg(Color::Gray)),
            Span::styled(format!("< {:>2} >", form.scores[idx]), focused(field)),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "j/k field  h/l change  Enter add game",
        Style::default().fg(Color::DarkGray),
    )));

    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_players(f: &mut Frame, area: Rect, app: &App) {
    let block = default_border(Color::White).title(" Manage Players ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    if inner.width == 0 || inner.height < 4 {
        return;
    }

    let [list_area, input_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(3)]).areas(inner);

    let players = &app.state.league.players;
    if players.is_empty() {
        draw_placeholder(f, list_area, "Roster is empty. Press a to add a player.");
    } else {
        let items: Vec<ListItem> = players.iter().map(|p| ListItem::new(p.as_str())).collect();
        let list = List::new(items)
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(app.state.players.selected));
        f.render_stateful_widget(list, list_area, &mut state);
    }

    let composing = app.state.players.composing;
    let (title, input, input_style) = if composing {
        (
            " new player ",
            format!("> {}_", app.state.players.input),
            Style::default().fg(Color::Yellow),
        )
    } else {
        (
            " players ",
            format!("{} players. a=add  d=remove selected  j/k=select", players.len()),
            Style::default().fg(Color::DarkGray),
        )
    };
    f.render_widget(
        Paragraph::new(input)
            .style(input_style)
            .block(default_border(Color::DarkGray).title(title)),
        input_area,
    );
}

fn draw_help(f: &mut Frame, area: Rect) {
    let block = default_border(Color::White).title(" Help ");
    let inner = block.inner(area);
    f.render_widget(block, area);
    let lines: Vec<Line> = HELP_LINES.iter().map(|l| Line::from(*l)).collect();
    f.render_widget(Paragraph::new(lines), inner);
}

fn draw_logs(f: &mut Frame, area: Rect) {
    let widget = TuiLoggerWidget::default()
        .block(default_border(Color::DarkGray).title(" Logs "))
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray))
        .style_debug(Style::default().fg(Color::DarkGray));
    f.render_widget(widget, area);
}

fn draw_status(f: &mut Frame, area: Rect, app: &App) {
    let Some(status) = app.state.status.as_ref() else {
        return;
    };
    let style = if status.is_error {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Green)
    };
    let line = Line::from(vec![
        Span::styled(format!(" [{}] ", status.timestamp), Style::default().fg(Color::DarkGray)),
        Span::styled(status.text.as_str(), style),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_reset_confirm(f: &mut Frame, area: Rect) {
    let width = 46.min(area.width);
    let height = 5.min(area.height);
    let popup = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new("Reset all players and delete every game?\n\ny = reset, any other key = cancel")
            .alignment(Alignment::Center)
            .block(default_border(Color::Red).title(" Reset Database ")),
        popup,
    );
}

fn draw_loading_spinner(f: &mut Frame, area: Rect, app: &App, loading: LoadingState) {
    if !loading.is_loading && loading.spinner_char != ERROR_CHAR {
        return;
    }
    let style = match loading.spinner_char {
        ERROR_CHAR => Style::default().fg(Color::Red),
        _ => Style::default().fg(Color::White),
    };
    let spinner = Paragraph::new(loading.spinner_char.to_string())
        .alignment(Alignment::Right)
        .style(style);
    let area = if app.settings.full_screen {
        Rect::new(area.width.saturating_sub(3), area.height.saturating_sub(2), 1, 1)
    } else {
        Rect::new(area.width.saturating_sub(11), 1, 1, 1)
    };
    f.render_widget(spinner, area);
}
