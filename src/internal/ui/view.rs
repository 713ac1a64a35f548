use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs, Wrap},
};

use super::app::{App, BackendStatus, InputMode, Page};
use crate::internal::confidence::{ConfidenceTier, format_percent};
use crate::internal::list::{FetchState, RemoteList};
use crate::internal::models::AnalysisResult;
use crate::internal::workflow::WorkflowState;
use crate::utils::datetime::format_timestamp;
use crate::utils::theme_loader::TuiTheme;

pub const EMPTY_MONUMENTS_MESSAGE: &str = "No monuments available at the moment.";
pub const EMPTY_HISTORY_MESSAGE: &str =
    "No analysis history yet. Upload an image on the Home tab to get started.";
const RETRY_HINT: &str = "Press r to try again.";

#[tracing::instrument(skip(app, f))]
pub fn draw(app: &mut App, f: &mut Frame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(
        Block::default().style(
            Style::default()
                .bg(app.theme.background)
                .fg(app.theme.foreground),
        ),
        f.area(),
    );

    render_top_bar(app, f, chunks[0]);

    match app.page {
        Page::Home => render_home(app, f, chunks[1]),
        Page::Explore => render_explore(app, f, chunks[1]),
        Page::History => render_history(app, f, chunks[1]),
        Page::About => render_about(&app.theme, f, chunks[1]),
    }

    render_status_bar(app, f, chunks[2]);

    if app.input_mode == InputMode::PathEntry {
        render_path_prompt(app, f);
    }

    if app.notification.is_some() {
        render_notification(app, f);
    }

    if app.show_help {
        render_help_overlay(app, f);
    }
}

/// Tier badge followed by the percentage, e.g. `[ High Confidence ] 92.0%`.
/// Shared by the result card and the history list so both classify the same way.
pub fn confidence_spans(confidence: f64) -> Vec<Span<'static>> {
    let tier = ConfidenceTier::from_confidence(confidence);
    vec![
        Span::styled(
            format!(" {} ", tier.badge_text()),
            Style::default()
                .bg(tier.color())
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            format_percent(confidence),
            Style::default().fg(tier.color()),
        ),
    ]
}

/// Lines of the analysis result card. Optional sections are omitted when the
/// backend left the field out.
pub fn result_card_lines(
    result: &AnalysisResult,
    narration_playing: bool,
    theme: &TuiTheme,
) -> Vec<Line<'static>> {
    let label = Style::default().fg(theme.muted);
    let mut lines = vec![
        Line::from(Span::styled(
            result.landmark.clone(),
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(confidence_spans(result.confidence)),
        Line::default(),
    ];

    if let Some(year) = &result.year_built {
        lines.push(Line::from(vec![
            Span::styled("Built: ", label),
            Span::raw(year.clone()),
        ]));
    }
    if let Some(location) = &result.location {
        lines.push(Line::from(vec![
            Span::styled("Location: ", label),
            Span::raw(location.clone()),
        ]));
    }
    if result.image_url.is_some() {
        lines.push(Line::from(Span::styled("Reference image: press i to open", label)));
    }
    if result.year_built.is_some() || result.location.is_some() || result.image_url.is_some() {
        lines.push(Line::default());
    }

    lines.push(Line::from(Span::styled(
        "Historical Summary",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(result.summary.clone()));

    if result.audio_url.is_some() {
        let state = match narration_playing {
            true => "■ Playing (p to stop)",
            false => "▶ Listen to narration (p to play)",
        };
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            state,
            Style::default().fg(theme.accent),
        )));
    }
    if result.reference_url.is_some() {
        lines.push(Line::from(Span::styled(
            "Learn More on Wikipedia (w)",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::UNDERLINED),
        )));
    }

    lines
}

pub fn render_result_card(
    f: &mut Frame,
    area: Rect,
    result: &AnalysisResult,
    narration_playing: bool,
    theme: &TuiTheme,
) {
    let card = Paragraph::new(result_card_lines(result, narration_playing, theme))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border))
                .title(" Analysis Result "),
        );
    f.render_widget(card, area);
}

fn render_top_bar(app: &App, f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(20)])
        .split(area);

    let titles: Vec<Line> = Page::ALL
        .iter()
        .enumerate()
        .map(|(i, page)| Line::from(format!("{} {}", i + 1, page)))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.page.index())
        .style(Style::default().fg(app.theme.muted))
        .highlight_style(
            Style::default()
                .fg(app.theme.accent)
                .add_modifier(Modifier::BOLD),
        )
        .divider("|");
    f.render_widget(tabs, chunks[0]);

    let (text, color) = match app.backend_status {
        BackendStatus::Unknown => ("backend: ...", app.theme.muted),
        BackendStatus::Online => ("backend: online", Color::Green),
        BackendStatus::Offline => ("backend: offline", Color::Red),
    };
    let status = Paragraph::new(text)
        .alignment(Alignment::Right)
        .style(Style::default().fg(color));
    f.render_widget(status, chunks[1]);
}

fn render_home(app: &mut App, f: &mut Frame, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(area);

    render_upload_panel(app, f, chunks[0]);

    let processing = app.workflow.is_processing();
    let action_line = match app.workflow.state() {
        WorkflowState::Analyzing(_) => Some(Line::from(Span::styled(
            format!("{} Processing...", app.get_spinner_char()),
            Style::default().fg(app.theme.accent),
        ))),
        WorkflowState::Selected(_) | WorkflowState::Failed { .. } => Some(Line::from(Span::styled(
            "[Enter] Analyze Image",
            Style::default()
                .fg(app.theme.selection_fg)
                .bg(app.theme.selection_bg)
                .add_modifier(Modifier::BOLD),
        ))),
        WorkflowState::Idle | WorkflowState::Result { .. } => None,
    };
    if let Some(line) = action_line {
        f.render_widget(Paragraph::new(line).alignment(Alignment::Center), chunks[1]);
    }

    match app.workflow.state() {
        WorkflowState::Failed { message, .. } => {
            let error = Paragraph::new(message.as_str())
                .style(Style::default().fg(Color::Red))
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Red))
                        .title(" Error "),
                );
            let height = chunks[2].height.min(3);
            f.render_widget(error, Rect { height, ..chunks[2] });
        }
        WorkflowState::Result { result, .. } => {
            let playing = app
                .audio
                .is_playing(&crate::internal::audio::PlaybackKey::ResultCard);
            render_result_card(f, chunks[2], result, playing, &app.theme);
        }
        _ if !processing => {
            let hint = Paragraph::new(
                "Analyze a historical photo to identify the landmark and hear its story.",
            )
            .style(Style::default().fg(app.theme.muted))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            f.render_widget(hint, chunks[2]);
        }
        _ => {}
    }
}

fn render_upload_panel(app: &App, f: &mut Frame, area: Rect) {
    let processing = app.workflow.is_processing();
    let text_style = match processing {
        true => Style::default().fg(app.theme.muted),
        false => Style::default().fg(app.theme.foreground),
    };

    let lines = match app.workflow.image() {
        Some(image) => vec![
            Line::from(vec![
                Span::styled(
                    image.filename.clone(),
                    text_style.add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!("  {}", image.size_label()), text_style),
            ]),
            Line::from(Span::styled(
                match processing {
                    true => "",
                    false => "x: clear | o: choose another | drop a file to replace",
                },
                Style::default().fg(app.theme.muted),
            )),
        ],
        None => vec![
            Line::from(Span::styled(
                "Upload Historical Image",
                text_style.add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Drop an image file onto this window, or press o to browse",
                text_style,
            )),
            Line::from(Span::styled(
                "Supports JPG, PNG, GIF, and WebP formats",
                Style::default().fg(app.theme.muted),
            )),
        ],
    };

    let panel = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border))
            .title(" Image "),
    );
    f.render_widget(panel, area);
}

/// Loading, error and empty states shared by the list pages. Returns `false`
/// when the list itself should be drawn.
fn render_list_state<T>(
    app: &App,
    list: &RemoteList<T>,
    noun: &str,
    empty_message: &str,
    f: &mut Frame,
    area: Rect,
) -> bool {
    let (text, style) = match &list.state {
        FetchState::Idle | FetchState::Loading => (
            format!("{} Loading {}...", app.get_spinner_char(), noun),
            Style::default().fg(app.theme.accent),
        ),
        FetchState::Failed(message) => (
            format!("{}\n{}", message, RETRY_HINT),
            Style::default().fg(Color::Red),
        ),
        FetchState::Loaded if list.items.is_empty() => (
            empty_message.to_string(),
            Style::default().fg(app.theme.muted),
        ),
        FetchState::Loaded => return false,
    };

    let p = Paragraph::new(text)
        .style(style)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(app.theme.border)));
    f.render_widget(p, area);
    true
}

fn render_explore(app: &mut App, f: &mut Frame, area: Rect) {
    if render_list_state(
        app,
        &app.monuments,
        "monuments",
        EMPTY_MONUMENTS_MESSAGE,
        f,
        area,
    ) {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let items: Vec<ListItem> = app
        .monuments
        .items
        .iter()
        .map(|m| {
            let mut spans = vec![Span::raw(m.title.clone())];
            if let Some(year) = &m.year_built {
                spans.push(Span::styled(
                    format!(" ({})", year),
                    Style::default().fg(app.theme.muted),
                ));
            }
            if app
                .audio
                .is_playing(&crate::internal::audio::PlaybackKey::Monument(m.id.clone()))
            {
                spans.push(Span::styled(" ♪", Style::default().fg(app.theme.accent)));
            }
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border))
                .title(format!(" Monuments ({}) ", app.monuments.items.len())),
        )
        .highlight_style(
            Style::default()
                .bg(app.theme.selection_bg)
                .fg(app.theme.selection_fg),
        )
        .highlight_symbol("> ");
    f.render_stateful_widget(list, chunks[0], &mut app.monuments.list_state);

    let Some(monument) = app.monuments.selected() else {
        return;
    };
    let label = Style::default().fg(app.theme.muted);
    let mut lines = vec![
        Line::from(Span::styled(
            monument.title.clone(),
            Style::default()
                .fg(app.theme.accent)
                .add_modifier(Modifier::BOLD),
        )),
        Line::default(),
    ];
    if let Some(year) = &monument.year_built {
        lines.push(Line::from(vec![
            Span::styled("Built: ", label),
            Span::raw(year.clone()),
        ]));
    }
    if let Some(location) = &monument.location {
        lines.push(Line::from(vec![
            Span::styled("Location: ", label),
            Span::raw(location.clone()),
        ]));
    }
    lines.push(Line::from(monument.short_text.clone()));
    lines.push(Line::default());
    if monument.audio_preview_url.is_some() {
        let key = crate::internal::audio::PlaybackKey::Monument(monument.id.clone());
        let text = match app.audio.is_playing(&key) {
            true => "■ Playing preview (p to stop)",
            false => "▶ Audio preview (p to play)",
        };
        lines.push(Line::from(Span::styled(text, Style::default().fg(app.theme.accent))));
    }
    lines.push(Line::from(Span::styled("i: open image", label)));
    if monument.reference_url.is_some() {
        lines.push(Line::from(Span::styled("w: learn more", label)));
    }

    let detail = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(detail, chunks[1]);
}

fn render_history(app: &mut App, f: &mut Frame, area: Rect) {
    if render_list_state(
        app,
        &app.history,
        "history",
        EMPTY_HISTORY_MESSAGE,
        f,
        area,
    ) {
        return;
    }

    let muted = Style::default().fg(app.theme.muted);
    let items: Vec<ListItem> = app
        .history
        .items
        .iter()
        .map(|entry| {
            let mut title = vec![
                Span::styled(
                    entry.landmark.clone(),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
            ];
            title.extend(confidence_spans(entry.confidence));

            let mut meta = vec![Span::styled(
                format!("  {} | {}", entry.filename, format_timestamp(&entry.timestamp)),
                muted,
            )];
            if app.pending_deletes.contains(&entry.id) {
                meta.push(Span::styled(" | deleting...", Style::default().fg(Color::Red)));
            }
            ListItem::new(vec![Line::from(title), Line::from(meta)])
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border))
                .title(format!(" History ({}) ", app.history.items.len())),
        )
        .highlight_style(
            Style::default()
                .bg(app.theme.selection_bg)
                .fg(app.theme.selection_fg),
        )
        .highlight_symbol("> ");
    f.render_stateful_widget(list, area, &mut app.history.list_state);
}

fn render_about(theme: &TuiTheme, f: &mut Frame, area: Rect) {
    let heading = Style::default()
        .fg(theme.accent)
        .add_modifier(Modifier::BOLD);
    let lines = vec![
        Line::from(Span::styled("About ChronoScope", heading)),
        Line::default(),
        Line::from(
            "ChronoScope identifies historical landmarks in photographs. Upload a photo on the \
             Home tab and the backend recognizes the landmark, rates how sure it is, and returns \
             a short history with optional narrated audio.",
        ),
        Line::default(),
        Line::from(Span::styled("Confidence", heading)),
        Line::from(vec![
            Span::styled(" High ", Style::default().bg(Color::Green).fg(Color::Black)),
            Span::raw(" 80% and above"),
        ]),
        Line::from(vec![
            Span::styled(" Medium ", Style::default().bg(Color::Yellow).fg(Color::Black)),
            Span::raw(" 60% to 80%"),
        ]),
        Line::from(vec![
            Span::styled(" Low ", Style::default().bg(Color::Red).fg(Color::Black)),
            Span::raw(" below 60%"),
        ]),
        Line::default(),
        Line::from(Span::styled("Explore and History", heading)),
        Line::from(
            "Explore lists curated monuments with audio previews. History keeps your past \
             analyses; select one and press d to delete it.",
        ),
    ];

    let p = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(p, area);
}

fn render_status_bar(app: &App, f: &mut Frame, area: Rect) {
    let status = match (app.loading_description(), app.input_mode, app.page) {
        (Some(desc), _, _) => format!("{} {}", app.get_spinner_char(), desc),
        (None, InputMode::PathEntry, _) => "Type a path | Enter: Select | Esc: Cancel".to_string(),
        (None, InputMode::Normal, Page::Home) => {
            "o: Browse | x: Clear | Enter: Analyze | p: Audio | w: Wikipedia | Tab: Page | ?: Help | q: Quit"
                .to_string()
        }
        (None, InputMode::Normal, Page::Explore) => {
            "j/k: Nav | p: Preview | i: Image | w: Learn More | r: Refresh | ?: Help | q: Quit"
                .to_string()
        }
        (None, InputMode::Normal, Page::History) => {
            let count = match app.history.items.len() {
                0 => "No history".to_string(),
                n => format!("History: {}", n),
            };
            format!(
                "j/k: Nav | d: Delete | i: Image | r: Refresh | ?: Help | q: Quit | {}",
                count
            )
        }
        (None, InputMode::Normal, Page::About) => {
            format!("ChronoScope v{} | Tab: Page | ?: Help | q: Quit", app.app_version)
        }
    };

    let p = Paragraph::new(status)
        .block(Block::default().style(Style::default().bg(app.theme.selection_bg)))
        .style(Style::default().fg(app.theme.selection_fg));
    f.render_widget(p, area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height);
    Rect::new(
        area.x + area.width.saturating_sub(width) / 2,
        area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    )
}

fn render_path_prompt(app: &App, f: &mut Frame) {
    let area = centered_rect(70, 3, f.area());
    let input = Paragraph::new(format!("{}█", app.path_input))
        .style(Style::default().bg(app.theme.background).fg(app.theme.foreground))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.selection_bg))
                .title(" Image path (JPG, PNG, GIF, WebP) ")
                .title_style(
                    Style::default()
                        .fg(app.theme.selection_fg)
                        .bg(app.theme.selection_bg)
                        .add_modifier(Modifier::BOLD),
                ),
        );
    f.render_widget(Clear, area);
    f.render_widget(input, area);
}

fn render_notification(app: &App, f: &mut Frame) {
    if let Some(notification) = &app.notification {
        let width = u16::try_from(notification.message.chars().count())
            .unwrap_or(u16::MAX)
            .saturating_add(4);
        let area = centered_rect(width, 3, f.area());

        let popup = Paragraph::new(notification.message.as_str())
            .style(
                Style::default()
                    .bg(notification.kind.color())
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.border))
                    .title(notification.kind.title()),
            )
            .alignment(Alignment::Center);

        f.render_widget(Clear, area);
        f.render_widget(popup, area);
    }
}

fn render_help_overlay(app: &App, f: &mut Frame) {
    let sections: [(&str, &[(&str, &str)]); 4] = [
        (
            "Global",
            &[
                ("Tab / Shift-Tab", "Next / previous page"),
                ("1-4", "Jump to page"),
                ("j/k, ↓/↑", "Move selection"),
                ("?", "Toggle help"),
                ("q, Ctrl-c", "Quit"),
            ],
        ),
        (
            "Home",
            &[
                ("o", "Type an image path"),
                ("drop / paste", "Select the dropped image"),
                ("x", "Clear the image"),
                ("Enter, a", "Analyze"),
                ("p", "Play / stop narration"),
                ("w / i", "Open Wikipedia / image"),
            ],
        ),
        (
            "Explore",
            &[
                ("p, Enter", "Play / stop audio preview"),
                ("w / i", "Open reference / image"),
                ("r", "Refresh"),
            ],
        ),
        (
            "History",
            &[("d, Delete", "Delete entry"), ("r", "Refresh")],
        ),
    ];

    let mut lines = Vec::new();
    for (title, bindings) in sections {
        lines.push(Line::from(Span::styled(
            title,
            Style::default()
                .fg(app.theme.accent)
                .add_modifier(Modifier::BOLD),
        )));
        for (keys, desc) in bindings {
            lines.push(Line::from(vec![
                Span::styled(format!("  {:<16}", keys), Style::default().fg(app.theme.foreground)),
                Span::styled(*desc, Style::default().fg(app.theme.muted)),
            ]));
        }
        lines.push(Line::default());
    }

    let height = lines.len() as u16 + 2;
    let area = centered_rect(60, height, f.area());
    let help = Paragraph::new(lines)
        .style(Style::default().bg(app.theme.background))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border))
                .title(" Help (Esc to close) "),
        );
    f.render_widget(Clear, area);
    f.render_widget(help, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confidence_spans_use_tier_color() {
        let spans = confidence_spans(0.65);
        assert_eq!(spans[0].content, " Medium Confidence ");
        assert_eq!(spans[0].style.bg, Some(Color::Yellow));
        assert_eq!(spans[2].content, "65.0%");
    }

    #[test]
    fn out_of_range_confidence_shows_placeholder() {
        let spans = confidence_spans(1.7);
        assert_eq!(spans[0].content, " Low Confidence ");
        assert_eq!(spans[2].content, "--%");
    }

    #[test]
    fn card_omits_missing_sections() {
        let result = AnalysisResult {
            landmark: "Colosseum".to_string(),
            confidence: 0.55,
            summary: "Amphitheatre.".to_string(),
            year_built: None,
            location: None,
            image_url: None,
            audio_url: None,
            reference_url: None,
        };
        let text: Vec<String> = result_card_lines(&result, false, &TuiTheme::default())
            .iter()
            .map(|l| l.to_string())
            .collect();
        assert!(text.iter().any(|l| l == "Amphitheatre."));
        assert!(!text.iter().any(|l| l.contains("Built")));
        assert!(!text.iter().any(|l| l.contains("narration")));
        assert!(!text.iter().any(|l| l.contains("Wikipedia")));
    }
}
