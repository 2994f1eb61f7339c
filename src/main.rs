// Ripple — Audio-reactive bar visualizer demo
//
// Interactive TUI around the visualizer engine: toggle the microphone,
// cycle conversational states, force demo mode, mirror the bars, or let
// kiosk mode walk through the states on its own.

use std::fs::OpenOptions;
use std::io::{self, Stdout, Write as _};
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use ripple::audio::MicCapture;
use ripple::config::RippleConfig;
use ripple::state::VisualState;
use ripple::viz::{BarFrame, BarVisualizer, BarWidget};

/// Milliseconds between UI frames (~30 fps draw cadence).
const FRAME_POLL_MS: u64 = 33;
/// Seconds between kiosk state changes.
const KIOSK_PERIOD_SECS: u64 = 4;

/// Application state for the TUI.
struct App {
    /// Current visual state, as supplied to the engine.
    state: Option<VisualState>,
    /// Whether the microphone is attached.
    mic_on: bool,
    /// Whether kiosk auto-cycling is active.
    kiosk: bool,
    /// Error message to display, if any.
    error: Option<String>,
}

/// Messages sent from background tasks to the main TUI loop.
enum AppMessage {
    AdvanceState,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        print_usage();
        return Ok(());
    }
    let config = parse_config(&args)?;

    // Set up terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app, ensuring we restore the terminal on exit
    let result = run_app(&mut terminal, config).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn print_usage() {
    println!("ripple: audio-reactive bar visualizer demo");
    println!();
    println!("Usage: ripple [options]");
    println!("  --config <path>   load settings from a JSON file");
    println!("  --bars <n>        number of bars (default 15)");
    println!("  --state <name>    initial state (connecting, listening, ...)");
    println!("  --demo            force the synthetic animation");
    println!("  --center          mirror the bars around the center line");
    println!("  --kiosk           auto-cycle through states");
    println!();
    println!("Keys: [Space] mic on/off  [d] demo  [c] center  [←/→] state  [q] quit");
}

/// Build the effective config from an optional file plus flag overrides.
fn parse_config(args: &[String]) -> Result<RippleConfig> {
    let mut config = match flag_value(args, "--config") {
        Some(path) => RippleConfig::load(Path::new(&path))?,
        None => RippleConfig::default(),
    };
    if let Some(bars) = flag_value(args, "--bars") {
        config.bar_count = bars
            .parse()
            .with_context(|| format!("invalid --bars value '{}'", bars))?;
    }
    if let Some(state) = flag_value(args, "--state") {
        config.state = Some(state);
    }
    if args.iter().any(|a| a == "--demo") {
        config.demo = true;
    }
    if args.iter().any(|a| a == "--center") {
        config.center_align = true;
    }
    if args.iter().any(|a| a == "--kiosk") {
        config.kiosk = true;
    }
    Ok(config)
}

/// Value of `--flag value` style arguments.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.windows(2).find_map(|w| {
        if w[0] == flag {
            Some(w[1].clone())
        } else {
            None
        }
    })
}

/// Main event loop.
async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    config: RippleConfig,
) -> Result<()> {
    let mut app = App {
        state: config.initial_state(),
        mic_on: false,
        kiosk: config.kiosk,
        error: None,
    };
    let mut viz = BarVisualizer::new(config.visualizer_options());
    viz.set_state(app.state);

    let epoch = Instant::now();

    // Channel for all messages to the TUI
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<AppMessage>();

    // Kiosk mode: advance the state on a timer in the background
    if app.kiosk {
        log("kiosk: auto-cycle enabled");
        let tx_kiosk = tx.clone();
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(Duration::from_secs(KIOSK_PERIOD_SECS)).await;
                if tx_kiosk.send(AppMessage::AdvanceState).is_err() {
                    return;
                }
            }
        });
    }

    loop {
        // Drain all pending messages (non-blocking)
        while let Ok(msg) = rx.try_recv() {
            match msg {
                AppMessage::AdvanceState => {
                    let next = VisualState::normalize(app.state).next();
                    log(&format!("kiosk: state -> {}", next.name()));
                    app.state = Some(next);
                    viz.set_state(app.state);
                }
            }
        }

        // Compose and draw one frame
        let now_ms = epoch.elapsed().as_secs_f64() * 1000.0;
        let frame = viz.compose(now_ms);
        terminal.draw(|f| render(f, &app, &frame))?;

        // Poll for keyboard events
        if event::poll(Duration::from_millis(FRAME_POLL_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                    KeyCode::Char(' ') => toggle_mic(&mut app, &mut viz),
                    KeyCode::Char('d') => {
                        let demo = !viz.options().demo;
                        viz.set_demo(demo);
                        log(&format!("ui: demo {}", if demo { "on" } else { "off" }));
                    }
                    KeyCode::Char('c')
                        if key
                            .modifiers
                            .contains(crossterm::event::KeyModifiers::CONTROL) =>
                    {
                        return Ok(());
                    }
                    KeyCode::Char('c') => {
                        let center = !viz.options().center_align;
                        viz.set_center_align(center);
                    }
                    KeyCode::Right => {
                        app.state = Some(VisualState::normalize(app.state).next());
                        viz.set_state(app.state);
                    }
                    KeyCode::Left => {
                        // Cycling backward is six steps forward
                        let mut state = VisualState::normalize(app.state);
                        for _ in 0..6 {
                            state = state.next();
                        }
                        app.state = Some(state);
                        viz.set_state(app.state);
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Attach or detach the microphone. Capture failures are shown in the
/// status line and the visualizer keeps animating synthetically.
fn toggle_mic(app: &mut App, viz: &mut BarVisualizer) {
    if app.mic_on {
        viz.detach();
        viz.set_demo(true);
        app.mic_on = false;
        log("ui: mic detached");
        return;
    }
    match MicCapture::open() {
        Ok(capture) => {
            viz.attach_media(Box::new(capture));
            viz.set_demo(false);
            app.mic_on = true;
            app.error = None;
            log("ui: mic attached");
        }
        Err(err) => {
            log(&format!("ui: mic open failed: {err}"));
            app.error = Some(format!("Mic unavailable: {}", err));
        }
    }
}

/// Write a timestamped line to ripple.log for debugging.
fn log(msg: &str) {
    if let Ok(mut f) = OpenOptions::new()
        .create(true)
        .append(true)
        .open("ripple.log")
    {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default();
        let _ = writeln!(f, "[{:.3}] {}", now.as_secs_f64(), msg);
    }
}

/// Render the TUI.
fn render(f: &mut ratatui::Frame, app: &App, frame: &BarFrame) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(10),   // Visualizer
            Constraint::Length(3), // Status
            Constraint::Length(3), // Bands read-out
            Constraint::Length(3), // Help bar
        ])
        .split(area);

    // Title bar with source indicator
    let source_indicator = if frame.live {
        Span::styled(" [live] ", Style::default().fg(Color::Green))
    } else {
        Span::styled(" [demo] ", Style::default().fg(Color::Yellow))
    };
    let kiosk_tag = if app.kiosk {
        Span::styled("(kiosk) ", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw("")
    };

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "Ripple Visualizer",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        kiosk_tag,
        source_indicator,
    ]))
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    // Visualizer
    let viz_block = Block::default();
    let viz_inner = viz_block.inner(chunks[1]);
    f.render_widget(viz_block, chunks[1]);
    f.render_widget(BarWidget::new(frame), viz_inner);

    // Status area
    let (status_text, status_color) = if let Some(err) = &app.error {
        (format!("  {}", err), Color::Yellow)
    } else if app.mic_on {
        (
            format!(
                "  ● {} live (volume {}%)",
                frame.state.name(),
                (frame.loudness * 100.0).round() as u32
            ),
            Color::Green,
        )
    } else {
        (
            format!("  {} (demo animation)", frame.state.name()),
            Color::Gray,
        )
    };
    let status = Paragraph::new(status_text)
        .style(Style::default().fg(status_color))
        .block(Block::default().title(" Status ").borders(Borders::ALL));
    f.render_widget(status, chunks[2]);

    // Per-band percentages
    let bands_text = frame
        .values
        .iter()
        .map(|v| format!("{:>3}%", (v * 100.0).round() as u32))
        .collect::<Vec<_>>()
        .join(" ");
    let bands = Paragraph::new(format!("  {}", bands_text))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().title(" Bands ").borders(Borders::ALL));
    f.render_widget(bands, chunks[3]);

    // Help bar
    let help_spans = vec![
        Span::styled(" [Space] ", Style::default().fg(Color::Cyan)),
        Span::raw(if app.mic_on { "Mic off  " } else { "Mic on  " }),
        Span::styled("[d] ", Style::default().fg(Color::Cyan)),
        Span::raw("Demo  "),
        Span::styled("[c] ", Style::default().fg(Color::Cyan)),
        Span::raw("Center  "),
        Span::styled("[←/→] ", Style::default().fg(Color::Cyan)),
        Span::raw("State  "),
        Span::styled("[q/Esc] ", Style::default().fg(Color::Cyan)),
        Span::raw("Quit"),
    ];
    let help = Paragraph::new(Line::from(help_spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[4]);
}
