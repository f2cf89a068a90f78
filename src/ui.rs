use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Map as WorldMap, MapResolution, Points},
        Block, Borders, List, ListItem, ListState, Paragraph, Wrap,
    },
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Focus, FormField, MapStatus};
use crate::coordinator::{FormState, SortState};
use crate::persistence::BlobStore;
use crate::workout::{Workout, WorkoutKind};

const FIELD_WIDTH: usize = 10;
const FORM_HEIGHT: u16 = 7;

fn kind_color(kind: WorkoutKind) -> Color {
    match kind {
        WorkoutKind::Running => Color::Rgb(0, 196, 106),
        WorkoutKind::Cycling => Color::Rgb(255, 181, 69),
    }
}

fn pane_block(title: String, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
}

pub fn draw<S: BlobStore>(app: &App<S>, f: &mut Frame) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(1)])
        .split(f.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(rows[0]);

    let form_visible = app.coordinator().form_state() == FormState::Visible;
    let sidebar = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(if form_visible { FORM_HEIGHT } else { 0 }),
            Constraint::Min(3),
        ])
        .split(columns[0]);

    if form_visible {
        render_form(app, f, sidebar[0]);
    }
    render_list(app, f, sidebar[1]);
    render_map(app, f, columns[1]);
    render_status(app, f, rows[1]);
}

fn field_line(label: &str, value: &str, unit: &str, focused: bool) -> Line<'static> {
    let pad = FIELD_WIDTH.saturating_sub(value.width());
    let value_style = if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default().add_modifier(Modifier::UNDERLINED)
    };
    Line::from(vec![
        Span::styled(format!("{label:<10}"), Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(format!("{value}{}", " ".repeat(pad)), value_style),
        Span::raw(format!(" {unit}")),
    ])
}

fn render_form<S: BlobStore>(app: &App<S>, f: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Form;
    let form = app.coordinator().form();
    let on = |field: FormField| focused && app.field == field;

    let kind_style = Style::default()
        .fg(kind_color(form.kind))
        .add_modifier(if on(FormField::Kind) {
            Modifier::REVERSED | Modifier::BOLD
        } else {
            Modifier::BOLD
        });

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{:<10}", "Type"), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(format!("< {} >", form.kind), kind_style),
        ]),
        field_line("Distance", &form.distance, "km", on(FormField::Distance)),
        field_line("Duration", &form.duration, "min", on(FormField::Duration)),
    ];
    lines.push(match form.kind {
        WorkoutKind::Running => field_line("Cadence", &form.cadence, "step/min", on(FormField::Extra)),
        WorkoutKind::Cycling => field_line("Elev Gain", &form.elevation, "meters", on(FormField::Extra)),
    });
    if let Some(location) = app.coordinator().pending_location() {
        lines.push(Line::from(Span::styled(
            format!("at {location}"),
            Style::default().add_modifier(Modifier::DIM),
        )));
    }

    let widget = Paragraph::new(lines).block(pane_block(" New workout ".to_string(), focused));
    f.render_widget(widget, area);
}

fn list_item(w: &Workout) -> ListItem<'static> {
    let (rate, rate_unit) = w.rate();
    let (detail, detail_unit) = w.detail();
    let color = kind_color(w.kind());
    ListItem::new(vec![
        Line::from(vec![
            Span::styled("▌", Style::default().fg(color)),
            Span::styled(
                w.description().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("▌", Style::default().fg(color)),
            Span::raw(format!(
                "{} {} km  ⏱ {} min  ⚡ {:.1} {}  {} {}",
                w.kind().icon(),
                w.distance_km(),
                w.duration_min(),
                rate,
                rate_unit,
                detail,
                detail_unit
            )),
        ]),
    ])
}

fn render_list<S: BlobStore>(app: &App<S>, f: &mut Frame, area: Rect) {
    let displayed = app.coordinator().displayed();
    let focused = app.focus == Focus::List;
    let sort = match app.coordinator().sort_state() {
        SortState::Unsorted => "",
        SortState::Sorted => " · by distance ↑",
    };
    let block = pane_block(format!(" Workouts ({}){} ", displayed.len(), sort), focused);

    if displayed.is_empty() {
        let hint = Paragraph::new("Pick a spot on the map and press Enter to log a workout.")
            .style(Style::default().add_modifier(Modifier::DIM))
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(hint, area);
        return;
    }

    let items: Vec<ListItem> = displayed.iter().map(|w| list_item(w)).collect();
    let list = List::new(items).block(block).highlight_style(if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    });
    let mut state = ListState::default().with_selected(Some(app.selected.min(displayed.len() - 1)));
    f.render_stateful_widget(list, area, &mut state);
}

fn render_map<S: BlobStore>(app: &App<S>, f: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Map;
    let Some(map) = app.coordinator().map() else {
        let message = match app.map_status {
            MapStatus::Unavailable => "Map unavailable: could not get your position.\nStart with --lat/--lng or set \"home\" in the config.",
            MapStatus::Locating | MapStatus::Ready => "Locating…",
        };
        let widget = Paragraph::new(message)
            .wrap(Wrap { trim: true })
            .block(pane_block(" Map ".to_string(), focused));
        f.render_widget(widget, area);
        return;
    };

    let (x_bounds, y_bounds) = map.bounds();
    let cursor = map.cursor();
    let markers = map.markers();
    let title = format!(" Map · zoom {} · {} ", map.zoom(), cursor);

    let canvas = Canvas::default()
        .block(pane_block(title, focused))
        .marker(symbols::Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(move |ctx| {
            ctx.draw(&WorldMap {
                color: Color::DarkGray,
                resolution: MapResolution::High,
            });
            ctx.layer();
            for marker in markers {
                let color = kind_color(marker.kind());
                let point = [(marker.location.lng, marker.location.lat)];
                ctx.draw(&Points {
                    coords: &point,
                    color,
                });
                ctx.print(
                    marker.location.lng,
                    marker.location.lat,
                    Span::styled(marker.popup.clone(), Style::default().fg(color)),
                );
            }
            ctx.print(
                cursor.lng,
                cursor.lat,
                Span::styled(
                    "+",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                ),
            );
        });
    f.render_widget(canvas, area);
}

fn render_status<S: BlobStore>(app: &App<S>, f: &mut Frame, area: Rect) {
    let line = match &app.status {
        Some(alert) => Line::from(Span::styled(
            alert.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        None => {
            let help = match app.focus {
                Focus::Map => "←↑↓→ move · +/- zoom · enter pick · o browser · s sort · tab list · R reset · q quit",
                Focus::Form => "tab/↑↓ field · ←→ type · enter save · esc map",
                Focus::List => "↑↓ select · enter show on map · o browser · s sort · tab map · R reset · q quit",
            };
            Line::from(Span::styled(help, Style::default().add_modifier(Modifier::DIM)))
        }
    };
    f.render_widget(Paragraph::new(line), area);
}
