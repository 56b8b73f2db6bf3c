//! Full-screen scratch view for a ticket that has already been played.

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;
use raspadinha_client::scratch::{GRID_COLUMNS, GRID_TILES};
use raspadinha_client::{RevealState, ScratchTicket, Symbol};
use raspadinha_types::scratch::ScratchCard;

/// Restores the terminal even when drawing fails halfway.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("enable raw mode")?;
        crossterm::execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

/// Let the player uncover `ticket` tile by tile. Returns the ticket in
/// whatever state it was left when the screen closed.
pub fn run(card: &ScratchCard, mut ticket: ScratchTicket) -> Result<ScratchTicket> {
    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    loop {
        terminal.draw(|f| draw(f, card, &ticket))?;

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        match key.code {
            KeyCode::Char(c @ '1'..='9') => {
                ticket.scratch((c as u8 - b'1') as usize);
            }
            KeyCode::Char('a') | KeyCode::Char(' ') => {
                ticket.reveal_all();
            }
            KeyCode::Char('q') | KeyCode::Esc => break,
            KeyCode::Enter if ticket.state() == RevealState::Completed => break,
            _ => {}
        }
    }
    Ok(ticket)
}

fn draw(f: &mut ratatui::Frame, card: &ScratchCard, ticket: &ScratchTicket) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(9),
            Constraint::Length(3),
        ])
        .split(f.area());

    let header = Paragraph::new(format!("{} | {}", card.name, card.price))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Raspadinha"));
    f.render_widget(header, chunks[0]);

    let winner = ticket.result().winning_prize().map(|prize| &prize.id);
    for (index, area) in tile_areas(chunks[1]).into_iter().enumerate() {
        let Some(symbol) = ticket.grid().get(index) else {
            continue;
        };
        let (text, style) = if ticket.is_revealed(index) {
            let style = match symbol {
                Symbol::Prize(id) if Some(id) == winner => Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
                _ => Style::default(),
            };
            (tile_label(card, symbol), style)
        } else {
            ((index + 1).to_string(), Style::default().fg(Color::DarkGray))
        };
        let tile = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(style)
            .block(Block::default().borders(Borders::ALL));
        f.render_widget(tile, area);
    }

    let footer = match ticket.state() {
        RevealState::Playing => "1-9 scratch | a reveal all | q quit".to_string(),
        RevealState::Completed => format!("{} Enter to close.", outcome_line(ticket)),
    };
    let footer = Paragraph::new(footer)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(footer, chunks[2]);
}

fn tile_areas(area: Rect) -> Vec<Rect> {
    let rows = GRID_TILES / GRID_COLUMNS;
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(area);
    row_areas
        .iter()
        .flat_map(|row| {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Ratio(1, GRID_COLUMNS as u32); GRID_COLUMNS])
                .split(*row)
                .to_vec()
        })
        .collect()
}

/// Text shown on an uncovered tile.
pub fn tile_label(card: &ScratchCard, symbol: &Symbol) -> String {
    match symbol {
        Symbol::Prize(id) => card
            .prizes
            .iter()
            .find(|prize| &prize.id == id)
            .map(|prize| prize.name.clone())
            .unwrap_or_else(|| "?".to_string()),
        Symbol::Blank => "-".to_string(),
    }
}

pub fn outcome_line(ticket: &ScratchTicket) -> String {
    match ticket.result().winning_prize() {
        Some(prize) => format!("You won {} ({})!", prize.name, prize.value),
        None => "No prize this time.".to_string(),
    }
}

/// Plain-text rendering of the uncovered grid.
pub fn grid_lines(card: &ScratchCard, ticket: &ScratchTicket) -> Vec<String> {
    ticket
        .grid()
        .rows()
        .map(|row| {
            row.iter()
                .map(|symbol| format!("{:^16}", tile_label(card, symbol)))
                .collect::<Vec<_>>()
                .join("|")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use raspadinha_client::Grid;
    use raspadinha_types::{
        scratch::{PlayResult, Prize, PrizeKind},
        Amount, Id,
    };

    fn card() -> ScratchCard {
        ScratchCard {
            id: Id::from("card"),
            name: "Raspa PIX".to_string(),
            description: None,
            price: Amount::from_reais(5),
            image_url: None,
            prizes: vec![
                Prize {
                    id: Id::from("p1"),
                    name: "R$ 10".to_string(),
                    value: Amount::from_reais(10),
                    kind: PrizeKind::Cash,
                    image_url: None,
                },
                Prize {
                    id: Id::from("p2"),
                    name: "R$ 500".to_string(),
                    value: Amount::from_reais(500),
                    kind: PrizeKind::Cash,
                    image_url: None,
                },
            ],
            is_active: true,
            rtp: None,
        }
    }

    fn ticket(card: &ScratchCard, prize: Option<Prize>) -> ScratchTicket {
        let result = PlayResult {
            game_id: Id::from("g1"),
            is_winner: prize.is_some(),
            prize,
            new_balance: Amount::ZERO,
        };
        let grid = Grid::for_result(&result, &card.prizes, &mut rand::thread_rng());
        ScratchTicket::new(result, grid)
    }

    #[test]
    fn labels_use_prize_names() {
        let card = card();
        assert_eq!(tile_label(&card, &Symbol::Prize(Id::from("p2"))), "R$ 500");
        assert_eq!(tile_label(&card, &Symbol::Prize(Id::from("gone"))), "?");
        assert_eq!(tile_label(&card, &Symbol::Blank), "-");
    }

    #[test]
    fn outcome_mentions_prize() {
        let card = card();
        let won = ticket(&card, Some(card.prizes[0].clone()));
        assert_eq!(outcome_line(&won), "You won R$ 10 (R$ 10,00)!");
        let lost = ticket(&card, None);
        assert_eq!(outcome_line(&lost), "No prize this time.");
    }

    #[test]
    fn grid_lines_have_three_rows() {
        let card = card();
        let lines = grid_lines(&card, &ticket(&card, None));
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|line| line.matches('|').count() == 2));
    }
}
