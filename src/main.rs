use anyhow::Result;

mod app;
mod gemini;
mod handler;
mod lifecycle;
mod persona;
mod prompt;
mod reply;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[tokio::main]
async fn main() -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(std::time::Duration::from_millis(300));
    let mut app = App::new();

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, events: &mut EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(app, event)?;
        }

        // Resolve a finished generation task outside the event handler so a
        // burst of key events cannot starve the state transition.
        app.poll_generation().await;
    }
    Ok(())
}
