mod components;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as GridLine, Points},
        Block, Borders, Clear, Paragraph, Row, Table,
    },
    Frame,
};
use std::sync::OnceLock;

use crate::app::{App, FormField, Popup, Section};
use crate::store::{COORD_MAX, COORD_MIN};
use crate::theme::Theme;
use components::centered_rect;

// Load theme colors once at startup
static THEME: OnceLock<Theme> = OnceLock::new();

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::load)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn header() -> Color { theme().header }

/// Vertical offset of the name label above its point, in map units
const LABEL_OFFSET: f64 = 15.0;

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    // Responsive layout: give the map more room on tall terminals
    let (map_height, list_height) = if area.height < 25 {
        (Constraint::Min(8), Constraint::Min(5))
    } else {
        (Constraint::Ratio(2, 3), Constraint::Ratio(1, 3))
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1), // Info line
            map_height,            // Map box
            list_height,           // Friends box
            Constraint::Length(1), // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);
    draw_map_box(f, app, chunks[1]);
    draw_friends_box(f, app, chunks[2]);
    draw_footer(f, chunks[3]);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::AddForm => draw_add_form(f, app),
        Popup::ConfirmDelete => draw_confirm_popup(f, app),
        Popup::Help => draw_help_popup(f),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: status/error message > record count
    let line = if let Some(ref status) = app.status_message {
        Line::from(vec![Span::styled(status, Style::default().fg(warning()))])
    } else {
        let count = app.friends.len();
        let summary = match count {
            0 => "No friends on the map".to_string(),
            1 => "1 friend on the map".to_string(),
            n => format!("{n} friends on the map"),
        };
        Line::from(vec![Span::styled(summary, Style::default().fg(text_dim()))])
    };

    let info = Paragraph::new(line).alignment(Alignment::Center);
    f.render_widget(info, area);
}

fn draw_map_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Map;
    let border_color = if is_active { accent() } else { inactive() };
    let title_style = if is_active {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(inactive())
    };

    let block = Block::default()
        .title(Span::styled(" Map ", title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let canvas = Canvas::default()
        .block(block)
        .marker(symbols::Marker::Braille)
        .x_bounds([COORD_MIN as f64, COORD_MAX as f64])
        .y_bounds([COORD_MIN as f64, COORD_MAX as f64])
        .paint(|ctx| {
            // Grid lines every 100 units
            let mut g = COORD_MIN + 100;
            while g < COORD_MAX {
                ctx.draw(&GridLine {
                    x1: g as f64,
                    y1: COORD_MIN as f64,
                    x2: g as f64,
                    y2: COORD_MAX as f64,
                    color: inactive(),
                });
                ctx.draw(&GridLine {
                    x1: COORD_MIN as f64,
                    y1: g as f64,
                    x2: COORD_MAX as f64,
                    y2: g as f64,
                    color: inactive(),
                });
                g += 100;
            }

            ctx.layer();

            for (i, (_, friend)) in app.friends.iter().enumerate() {
                let color = if i == app.selected { accent() } else { success() };
                ctx.draw(&Points {
                    coords: &[(friend.x as f64, friend.y as f64)],
                    color,
                });
            }

            ctx.layer();

            // Name labels sit just above their point, clamped to the top edge
            for (i, (_, friend)) in app.friends.iter().enumerate() {
                let label_color = if i == app.selected { accent() } else { text() };
                let label_y = (friend.y as f64 + LABEL_OFFSET).min(COORD_MAX as f64);
                ctx.print(
                    friend.x as f64,
                    label_y,
                    Line::styled(friend.name.clone(), Style::default().fg(label_color)),
                );
            }
        });

    f.render_widget(canvas, area);
}

fn draw_friends_box(f: &mut Frame, app: &App, area: Rect) {
    let is_active = app.section == Section::Friends;
    let border_color = if is_active { accent() } else { inactive() };
    let title_style = if is_active {
        Style::default().fg(accent()).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(inactive())
    };

    let block = Block::default()
        .title(Span::styled(" Friends ", title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let table_header = Row::new(vec![
        Span::styled("Name", Style::default().fg(header())),
        Span::styled("X", Style::default().fg(header())),
        Span::styled("Y", Style::default().fg(header())),
        Span::styled("", Style::default().fg(header())),
    ]);

    let rows: Vec<Row> = if app.friends.is_empty() {
        vec![Row::new(vec![Span::styled(
            "  No friends yet. Press (a) to add one",
            Style::default().fg(text_dim()),
        )])]
    } else {
        app.friends
            .iter()
            .enumerate()
            .map(|(i, (_, friend))| {
                let selected = i == app.selected && is_active;
                let row_style = if selected {
                    Style::default().bg(bg_selected()).fg(text())
                } else {
                    Style::default()
                };
                let hint = if selected { "(d)elete" } else { "" };

                Row::new(vec![
                    Span::styled(friend.name.clone(), Style::default().fg(text())),
                    Span::styled(friend.x.to_string(), Style::default().fg(text_dim())),
                    Span::styled(friend.y.to_string(), Style::default().fg(text_dim())),
                    Span::styled(hint, Style::default().fg(danger())),
                ])
                .style(row_style)
            })
            .collect()
    };

    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(10),
        ],
    )
    .header(table_header)
    .block(block);

    f.render_widget(table, area);
}

fn draw_footer(f: &mut Frame, area: Rect) {
    let hints = vec![
        Span::styled(" Tab", Style::default().fg(accent())),
        Span::styled(" switch │ ", Style::default().fg(text_dim())),
        Span::styled("j/k", Style::default().fg(accent())),
        Span::styled(" move │ ", Style::default().fg(text_dim())),
        Span::styled("a", Style::default().fg(accent())),
        Span::styled("dd │ ", Style::default().fg(text_dim())),
        Span::styled("d", Style::default().fg(accent())),
        Span::styled("elete │ ", Style::default().fg(text_dim())),
        Span::styled("R", Style::default().fg(accent())),
        Span::styled("efresh │ ", Style::default().fg(text_dim())),
        Span::styled("?", Style::default().fg(accent())),
        Span::styled(" help │ ", Style::default().fg(text_dim())),
        Span::styled("q", Style::default().fg(accent())),
        Span::styled(" quit", Style::default().fg(text_dim())),
    ];
    f.render_widget(Paragraph::new(Line::from(hints)), area);
}

fn draw_add_form(f: &mut Frame, app: &App) {
    let area = centered_rect(50, 40, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(Span::styled(
            " Add friend ",
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Name
            Constraint::Length(1), // X
            Constraint::Length(1), // Y
            Constraint::Min(0),
            Constraint::Length(1), // Hint
        ])
        .split(inner);

    let field_line = |label: &str, value: String, focused: bool| {
        let label_style = if focused {
            Style::default().fg(accent()).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(text_dim())
        };
        let value_style = if focused {
            Style::default().fg(text()).bg(bg_selected())
        } else {
            Style::default().fg(text())
        };
        Line::from(vec![
            Span::styled(format!("{label:>6}: "), label_style),
            Span::styled(value, value_style),
        ])
    };

    let name_focused = app.form.field == FormField::Name;
    let name_value = if name_focused {
        format!("{}█", app.form.name)
    } else if app.form.name.is_empty() {
        "(required)".to_string()
    } else {
        app.form.name.clone()
    };
    f.render_widget(
        Paragraph::new(field_line("Name", name_value, name_focused)),
        chunks[0],
    );

    let coord_value = |v: i64| format!("◄ {v:>3} ►  (0..{COORD_MAX}, step 10)");
    f.render_widget(
        Paragraph::new(field_line(
            "X",
            coord_value(app.form.x),
            app.form.field == FormField::X,
        )),
        chunks[1],
    );
    f.render_widget(
        Paragraph::new(field_line(
            "Y",
            coord_value(app.form.y),
            app.form.field == FormField::Y,
        )),
        chunks[2],
    );

    let hint = Line::from(vec![
        Span::styled("Tab", Style::default().fg(accent())),
        Span::styled(" next field │ ", Style::default().fg(text_dim())),
        Span::styled("←/→", Style::default().fg(accent())),
        Span::styled(" adjust │ ", Style::default().fg(text_dim())),
        Span::styled("Enter", Style::default().fg(accent())),
        Span::styled(" save │ ", Style::default().fg(text_dim())),
        Span::styled("Esc", Style::default().fg(accent())),
        Span::styled(" cancel", Style::default().fg(text_dim())),
    ]);
    f.render_widget(Paragraph::new(hint).alignment(Alignment::Center), chunks[4]);
}

fn draw_confirm_popup(f: &mut Frame, app: &App) {
    let Some((_, friend)) = app.selected_friend() else {
        return;
    };

    let area = centered_rect(40, 20, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(Span::styled(
            " Delete friend ",
            Style::default().fg(danger()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(danger()));

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("Remove ", Style::default().fg(text())),
            Span::styled(
                friend.name.clone(),
                Style::default().fg(danger()).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(" at ({}, {})?", friend.x, friend.y),
                Style::default().fg(text()),
            ),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Enter", Style::default().fg(accent())),
            Span::styled(" confirm │ ", Style::default().fg(text_dim())),
            Span::styled("n", Style::default().fg(accent())),
            Span::styled("/", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" cancel", Style::default().fg(text_dim())),
        ]),
    ];

    let content = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(block);
    f.render_widget(content, area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = centered_rect(50, 60, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(Span::styled(
            " Help ",
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    let key = |k: &str, desc: &str| {
        Line::from(vec![
            Span::styled(format!("  {k:<10}"), Style::default().fg(accent())),
            Span::styled(desc.to_string(), Style::default().fg(text())),
        ])
    };

    let lines = vec![
        Line::from(""),
        key("Tab", "Switch between map and list"),
        key("j/k ↑/↓", "Move selection"),
        key("a", "Add a friend"),
        key("d/Del", "Delete selected friend"),
        key("R", "Refresh from the database"),
        key("?", "Toggle this help"),
        key("q", "Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "  The map shows every friend's house on a 500x500 grid.",
            Style::default().fg(text_dim()),
        )]),
        Line::from(vec![Span::styled(
            "  Changes made by others appear on the next refresh.",
            Style::default().fg(text_dim()),
        )]),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}
