use chronoscope_tui::config::AppConfig;
use chronoscope_tui::internal::models::{AnalysisResult, HistoryEntry, SelectedImage};
use chronoscope_tui::internal::ui::app::{App, Page};
use chronoscope_tui::internal::ui::view;
use chronoscope_tui::utils::theme_loader::TuiTheme;
use ratatui::{Terminal, backend::TestBackend};

fn eiffel() -> AnalysisResult {
    AnalysisResult {
        landmark: "Eiffel Tower".to_string(),
        confidence: 0.92,
        summary: "Wrought-iron lattice tower.".to_string(),
        year_built: Some("1889".to_string()),
        location: Some("Paris, France".to_string()),
        image_url: None,
        audio_url: Some("/static/audio/eiffel.mp3".to_string()),
        reference_url: Some("https://en.wikipedia.org/wiki/Eiffel_Tower".to_string()),
    }
}

fn render(app: &mut App) -> String {
    let backend = TestBackend::new(100, 30);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal.draw(|f| view::draw(app, f)).unwrap();
    terminal
        .backend()
        .buffer()
        .content
        .iter()
        .map(|cell| cell.symbol())
        .collect()
}

#[test]
fn result_card_text() {
    let text: Vec<String> = view::result_card_lines(&eiffel(), false, &TuiTheme::default())
        .iter()
        .map(|line| format!(">{}", line))
        .collect();

    insta::assert_snapshot!(text.join("\n"), @r"
    >Eiffel Tower
    > High Confidence  92.0%
    >
    >Built: 1889
    >Location: Paris, France
    >
    >Historical Summary
    >Wrought-iron lattice tower.
    >
    >▶ Listen to narration (p to play)
    >Learn More on Wikipedia (w)
    ");
}

#[test]
fn home_page_shows_result_card() {
    let mut app = App::new(AppConfig::default()).unwrap();
    app.workflow
        .select_image(SelectedImage::new("eiffel.jpg", vec![0; 2048]))
        .unwrap();
    app.workflow.begin_analysis().unwrap();
    app.workflow.finish_analysis(Ok(eiffel()));

    let screen = render(&mut app);
    assert!(screen.contains("eiffel.jpg"));
    assert!(screen.contains("Eiffel Tower"));
    assert!(screen.contains("High Confidence"));
    assert!(screen.contains("92.0%"));
    assert!(!screen.contains("Analyze Image"));
}

#[test]
fn home_page_shows_progress_while_analyzing() {
    let mut app = App::new(AppConfig::default()).unwrap();
    app.workflow
        .select_image(SelectedImage::new("forum.png", vec![1, 2, 3]))
        .unwrap();

    let screen = render(&mut app);
    assert!(screen.contains("Analyze Image"));

    app.workflow.begin_analysis().unwrap();
    let screen = render(&mut app);
    assert!(screen.contains("Processing..."));
    assert!(!screen.contains("Analyze Image"));
}

#[test]
fn history_page_states() {
    let mut app = App::new(AppConfig::default()).unwrap();
    app.page = Page::History;

    let seq = app.history.begin_fetch();
    assert!(render(&mut app).contains("Loading history..."));

    app.history.apply(seq, Ok(Vec::new()));
    assert!(render(&mut app).contains("No analysis history yet."));

    let seq = app.history.begin_fetch();
    app.history.apply(
        seq,
        Ok(vec![HistoryEntry {
            id: "1".to_string(),
            filename: "ben.jpg".to_string(),
            landmark: "Big Ben".to_string(),
            confidence: 0.45,
            timestamp: "not a date".to_string(),
            image_url: None,
        }]),
    );
    let screen = render(&mut app);
    assert!(screen.contains("Big Ben"));
    assert!(screen.contains("Low Confidence"));
    assert!(screen.contains("45.0%"));
    assert!(screen.contains("not a date"));

    let seq = app.history.begin_fetch();
    app.history.apply(seq, Err("connection refused".to_string()));
    let screen = render(&mut app);
    assert!(screen.contains("Failed to load history. Please try again."));
    assert!(screen.contains("Press r to try again."));
}

#[test]
fn tabs_and_backend_status_render() {
    let mut app = App::new(AppConfig::default()).unwrap();
    app.page = Page::About;
    let screen = render(&mut app);
    assert!(screen.contains("1 Home"));
    assert!(screen.contains("4 About"));
    assert!(screen.contains("backend: ..."));
    assert!(screen.contains("About ChronoScope"));
}

#[test]
fn oversized_notification_is_clamped() {
    let mut app = App::new(AppConfig::default()).unwrap();
    app.notify_error("x".repeat(70_000));
    let screen = render(&mut app);
    assert!(screen.contains("Error"));
    assert!(screen.contains("xxxx"));
}
